//! egui 调试面板层
//!
//! [`GuiLayer`] 把 egui 的完整生命周期（事件转发 → 构建 UI → 细分 →
//! 上传 → 绘制）包在 [`OverlayPass`] 接口后面，由渲染器画在色调映射
//! 之后的 swapchain 上。
//!
//! # 每帧流程
//!
//! ```text
//! handle_input()             // AppHandler::on_event 里转发 winit 事件
//! run_ui(window, |ctx| …)    // AppHandler::update 里构建控件
//! ── Renderer ──
//! prepare()                  // 纹理增量 + 顶点缓冲上传
//! draw()                     // LoadOp::Load 叠加到 surface
//! ```

use winit::event::WindowEvent;
use winit::window::Window;

use crate::renderer::OverlayPass;

/// Egui overlay drawn on top of the rendered frame.
pub struct GuiLayer {
    /// Shared egui context (cheap to clone — reference-counted internally).
    egui_ctx: egui::Context,
    /// Bridges winit events into egui raw input.
    state: egui_winit::State,
    /// Egui's wgpu backend — owns GPU pipelines, textures, and vertex buffers.
    renderer: egui_wgpu::Renderer,

    /// Tessellated draw data produced by [`run_ui`](Self::run_ui), consumed
    /// by the prepare/draw phases.
    clipped_primitives: Vec<egui::ClippedPrimitive>,
    /// Texture create/update/free operations accumulated during the frame.
    textures_delta: egui::TexturesDelta,
    /// Current viewport size and DPI, kept in sync via [`resize`](Self::resize).
    screen_descriptor: egui_wgpu::ScreenDescriptor,
}

impl GuiLayer {
    /// Creates the layer for a window. `output_format` must match the
    /// surface the overlay is drawn onto.
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Window) -> Self {
        let size = window.inner_size();
        let egui_ctx = egui::Context::default();

        let id = egui_ctx.viewport_id();
        let state = egui_winit::State::new(egui_ctx.clone(), id, window, None, None, None);

        let renderer =
            egui_wgpu::Renderer::new(device, output_format, egui_wgpu::RendererOptions::default());

        Self {
            egui_ctx,
            state,
            renderer,
            clipped_primitives: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point: window.scale_factor() as f32,
            },
        }
    }

    /// Forwards a winit window event to egui.
    ///
    /// Returns `true` if egui consumed the event (the application should
    /// skip its own handling). Mouse-button releases are always reported as
    /// unconsumed so that orbit controls etc. can detect "drag end".
    pub fn handle_input(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);

        if let WindowEvent::MouseInput {
            state: winit::event::ElementState::Released,
            ..
        } = event
        {
            return false;
        }

        response.consumed
    }

    /// Runs one egui frame: begins the pass, builds the UI through
    /// `build_ui`, then tessellates the output for the draw phase.
    pub fn run_ui(&mut self, window: &Window, build_ui: impl FnOnce(&egui::Context)) {
        let raw_input = self.state.take_egui_input(window);
        self.egui_ctx.begin_pass(raw_input);

        build_ui(&self.egui_ctx);

        let egui::FullOutput {
            shapes,
            textures_delta,
            platform_output,
            ..
        } = self.egui_ctx.end_pass();

        self.state.handle_platform_output(window, platform_output);
        self.textures_delta = textures_delta;
        self.clipped_primitives = self
            .egui_ctx
            .tessellate(shapes, self.egui_ctx.pixels_per_point());
    }

    /// Updates the screen descriptor after a window resize.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f32) {
        self.screen_descriptor.size_in_pixels = [width, height];
        self.screen_descriptor.pixels_per_point = scale_factor;
    }

    /// True when the pointer hovers an egui widget; camera controls should
    /// ignore mouse input in that case.
    #[must_use]
    pub fn wants_pointer_input(&self) -> bool {
        self.egui_ctx.egui_wants_pointer_input()
    }

    /// True when a text field holds keyboard focus.
    #[must_use]
    pub fn wants_keyboard_input(&self) -> bool {
        self.egui_ctx.egui_wants_keyboard_input()
    }
}

impl OverlayPass for GuiLayer {
    fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        // 1. 上传新增/更新的 egui 纹理
        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        // 2. 顶点/索引缓冲走临时 encoder，立即提交
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui buffer upload"),
        });
        let user_cmd_bufs = self.renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &self.clipped_primitives,
            &self.screen_descriptor,
        );
        let mut cmd_bufs: Vec<wgpu::CommandBuffer> = Vec::with_capacity(1 + user_cmd_bufs.len());
        cmd_bufs.push(encoder.finish());
        cmd_bufs.extend(user_cmd_bufs);
        queue.submit(cmd_bufs);

        // 3. 释放 egui 不再引用的纹理
        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }

        self.textures_delta.set.clear();
        self.textures_delta.free.clear();
    }

    fn draw(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let mut rpass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.renderer.render(
            &mut rpass,
            &self.clipped_primitives,
            &self.screen_descriptor,
        );
    }
}
