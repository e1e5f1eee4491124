//! winit 应用外壳
//!
//! [`App`] 负责窗口创建、事件循环和每帧调度；使用方实现 [`AppHandler`]
//! 填入场景构建和每帧逻辑。`resumed` 里延迟初始化渲染器（winit 0.3x
//! 要求窗口在事件循环内创建），之后每次 `RedrawRequested` 走
//! update → render，`about_to_wait` 持续请求重绘。

pub mod input;

pub use input::Input;

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::errors::Result;
use crate::renderer::{OverlayPass, Renderer, RendererSettings};
use crate::scene::Scene;

/// Per-frame timing handed to [`AppHandler::update`].
#[derive(Debug, Clone, Copy)]
pub struct FrameState {
    /// Seconds since the app started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
}

/// Everything a handler may touch: the scene, the renderer, the collected
/// input state, and the window itself.
pub struct AppContext {
    pub scene: Scene,
    pub renderer: Renderer,
    pub input: Input,
    pub window: Arc<Window>,
}

impl AppContext {
    /// Current window aspect ratio.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.renderer.size();
        w as f32 / h.max(1) as f32
    }
}

/// 应用回调。`init` 建场景，`update` 每帧逻辑，`on_event` 可以截获
/// 原始事件（GUI 需要），`overlay` 提供画在 swapchain 上的最后一层。
pub trait AppHandler {
    /// Builds the scene. Called once, after the renderer is ready.
    fn init(&mut self, ctx: &mut AppContext) -> Result<()>;

    /// Raw event hook. Return `true` to consume the event before it
    /// reaches the input state (e.g. when the GUI wants it).
    fn on_event(&mut self, ctx: &mut AppContext, event: &WindowEvent) -> bool {
        let _ = (ctx, event);
        false
    }

    /// Per-frame logic, before the scene update and render.
    fn update(&mut self, ctx: &mut AppContext, frame: &FrameState);

    /// Overlay drawn after tone mapping (GUI). Default: none.
    fn overlay(&mut self) -> Option<&mut dyn OverlayPass> {
        None
    }
}

/// Application builder.
///
/// ```rust,ignore
/// App::new("demo")
///     .with_size(1280, 720)
///     .run(MyHandler::default())?;
/// ```
pub struct App {
    title: String,
    width: u32,
    height: u32,
    settings: RendererSettings,
}

impl App {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: 1280,
            height: 720,
            settings: RendererSettings::default(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: RendererSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the event loop until the window closes.
    pub fn run<H: AppHandler>(self, handler: H) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner {
            title: self.title,
            width: self.width,
            height: self.height,
            settings: self.settings,
            handler,
            ctx: None,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        };
        event_loop.run_app(&mut runner)?;
        Ok(())
    }
}

struct AppRunner<H: AppHandler> {
    title: String,
    width: u32,
    height: u32,
    settings: RendererSettings,

    handler: H,
    ctx: Option<AppContext>,

    start_time: Instant,
    last_frame: Instant,
}

impl<H: AppHandler> AppRunner<H> {
    fn frame(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        let now = Instant::now();
        let frame = FrameState {
            time: now.duration_since(self.start_time).as_secs_f32(),
            dt: now.duration_since(self.last_frame).as_secs_f32(),
        };
        self.last_frame = now;

        self.handler.update(ctx, &frame);
        ctx.input.end_frame();

        let overlay = self.handler.overlay();
        if let Err(e) = ctx.renderer.render_with_overlay(&mut ctx.scene, overlay) {
            log::error!("render failed: {e}");
        }
    }
}

impl<H: AppHandler> ApplicationHandler for AppRunner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                f64::from(self.width),
                f64::from(self.height),
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let renderer = match pollster::block_on(Renderer::new(
            window.clone(),
            self.settings.clone(),
            size.width,
            size.height,
        )) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("renderer initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut input = Input::new();
        input.handle_resize(size.width, size.height);

        let mut ctx = AppContext {
            scene: Scene::new(),
            renderer,
            input,
            window,
        };

        if let Err(e) = self.handler.init(&mut ctx) {
            log::error!("app initialization failed: {e}");
            event_loop.exit();
            return;
        }

        self.start_time = Instant::now();
        self.last_frame = self.start_time;
        self.ctx = Some(ctx);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        // GUI 等先截获；被消费的事件不进 Input
        let consumed = self.handler.on_event(ctx, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let Some(ctx) = self.ctx.as_mut() else {
                    return;
                };
                ctx.renderer.resize(size.width, size.height);
                ctx.input.handle_resize(size.width, size.height);

                // 投影跟随窗口比例
                if size.height > 0
                    && let Some(camera) = ctx.scene.main_camera_mut()
                {
                    camera.set_aspect(size.width as f32 / size.height as f32);
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            WindowEvent::CursorMoved { position, .. } if !consumed => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.input.handle_cursor_move(position.x, position.y);
                }
            }
            WindowEvent::MouseInput { state, button, .. } if !consumed => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.input.handle_mouse_input(state, button);
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.input.handle_mouse_wheel(delta);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !consumed => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.input.handle_keyboard_input(&event);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ctx) = &self.ctx {
            ctx.window.request_redraw();
        }
    }
}
