//! 渲染器模块
//!
//! [`Renderer`] 将一帧固定编排为:
//!
//! 1. 遮罩通道 (辉光开启时)：[`SelectiveBloom`] 把非辉光 Mesh 换成黑色材质，
//!    前向渲染进 `bloom_source`，随后恢复材质
//! 2. 基础通道：完整场景前向渲染进 `scene_color`
//! 3. 辉光链：prefilter → mip 降采样 → tent 升采样 → 与 `scene_color` 叠加
//! 4. 景深 (开启时)：CoC + 散景聚集
//! 5. 色调映射：写入 swapchain，之后可叠加 GUI overlay
//!
//! 所有离屏目标都是 HDR 浮点格式，只有最后一步落到 surface 格式。

pub mod context;
pub mod dynamic_buffer;
pub mod frustum;
pub mod passes;
pub mod pipeline;
pub mod resource_manager;
pub mod selective;
pub mod settings;
pub mod targets;

pub use context::WgpuContext;
pub use selective::{BLOOM_LAYER, MaskStats, SelectiveBloom};
pub use settings::RendererSettings;
pub use targets::RenderTargets;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::errors::{HaloError, Result};
use crate::scene::Scene;

use self::passes::{BloomPass, ColorSlot, DofPass, ForwardPass, ToneMappingPass};
use self::resource_manager::ResourceManager;

/// Format of every off-screen color target.
pub const HDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// A pass drawn onto the swapchain after tone mapping (debug GUI).
///
/// `prepare` may upload buffers and submit its own work; `draw` records a
/// single render pass that loads the existing surface contents.
pub trait OverlayPass {
    fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue);
    fn draw(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView);
}

/// 主渲染器
pub struct Renderer {
    pub ctx: WgpuContext,
    settings: RendererSettings,

    targets: RenderTargets,
    resources: ResourceManager,

    forward: ForwardPass,
    bloom: BloomPass,
    dof: DofPass,
    tone_mapping: ToneMappingPass,

    selective: SelectiveBloom,
    last_mask_stats: Option<MaskStats>,
}

impl Renderer {
    /// Initializes the GPU context and every pass for the given window.
    pub async fn new<W>(
        window: W,
        settings: RendererSettings,
        width: u32,
        height: u32,
    ) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let ctx = WgpuContext::new(window, &settings, width, height).await?;
        let device = &ctx.device;

        let targets = RenderTargets::new(device, width, height, settings.depth_format);
        let resources = ResourceManager::new(device, &ctx.queue);

        let forward = ForwardPass::new(device, settings.depth_format, resources.material_layout());
        let bloom = BloomPass::new(device);
        let dof = DofPass::new(device);
        let tone_mapping = ToneMappingPass::new(device, ctx.surface_format());

        Ok(Self {
            ctx,
            settings,
            targets,
            resources,
            forward,
            bloom,
            dof,
            tone_mapping,
            selective: SelectiveBloom::new(),
            last_mask_stats: None,
        })
    }

    /// Reconfigures the surface and recreates every off-screen target.
    ///
    /// Zero sizes (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.resize(width, height);
        self.targets.resize(&self.ctx.device, width, height);
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    #[inline]
    #[must_use]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.ctx.surface_format()
    }

    /// Mask-pass statistics of the last rendered frame, if bloom ran.
    #[inline]
    #[must_use]
    pub fn last_mask_stats(&self) -> Option<MaskStats> {
        self.last_mask_stats
    }

    /// Renders one frame without an overlay.
    pub fn render(&mut self, scene: &mut Scene) -> Result<()> {
        self.render_with_overlay(scene, None)
    }

    /// Renders one frame of `scene` through the full pipeline.
    ///
    /// Requires `scene.active_camera` to point at a camera node; frames
    /// without one are skipped. A lost or outdated surface reconfigures and
    /// skips the frame rather than failing.
    pub fn render_with_overlay(
        &mut self,
        scene: &mut Scene,
        mut overlay: Option<&mut dyn OverlayPass>,
    ) -> Result<()> {
        let (width, height) = self.ctx.size();
        if width == 0 || height == 0 {
            return Ok(());
        }

        scene.update_matrix_world();

        let Some(camera) = scene.main_camera().cloned() else {
            return Ok(());
        };

        let frame = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame)
            | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => frame,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                self.ctx.resize(width, height);
                return Ok(());
            }
            wgpu::CurrentSurfaceTexture::Timeout => {
                log::warn!("surface frame timed out, skipping frame");
                return Ok(());
            }
            e => return Err(HaloError::SurfaceError(e)),
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.resources.next_frame();

        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        // 1. 遮罩通道：黑色替换 → 渲染辉光源 → 恢复
        let bloom_enabled = scene.bloom.enabled;
        self.last_mask_stats = None;
        if bloom_enabled {
            let stats = self.selective.begin_mask_pass(scene)?;
            self.last_mask_stats = Some(stats);
            self.forward
                .prepare(device, queue, &mut self.resources, scene, &camera);

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bloom Source Encoder"),
            });
            self.forward.draw(
                &mut encoder,
                &self.resources,
                self.targets.bloom_source(),
                self.targets.depth(),
                wgpu::Color::BLACK,
            );
            queue.submit(std::iter::once(encoder.finish()));

            self.selective.end_mask_pass(scene)?;
        }

        // 2. 基础通道：完整场景
        self.forward
            .prepare(device, queue, &mut self.resources, scene, &camera);

        let clear = scene.background.map_or(self.settings.clear_color, |c| {
            wgpu::Color {
                r: f64::from(c.x),
                g: f64::from(c.y),
                b: f64::from(c.z),
                a: f64::from(c.w),
            }
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        self.forward.draw(
            &mut encoder,
            &self.resources,
            self.targets.scene_color(),
            self.targets.depth(),
            clear,
        );

        // 3/4/5. 后处理链，跟踪当前图像所在槽位
        let mut slot = ColorSlot::SceneColor;

        if bloom_enabled {
            self.bloom
                .prepare(device, queue, &self.targets, &mut scene.bloom);
            self.bloom.run(&mut encoder, &self.targets, &scene.bloom);
            slot = ColorSlot::PostA;
        }

        if scene.dof.enabled {
            self.dof
                .prepare(device, queue, &self.targets, slot, &camera, &mut scene.dof);
            slot = self.dof.run(&mut encoder, &self.targets, slot);
        }

        self.tone_mapping
            .prepare(device, queue, &self.targets, slot, &mut scene.tone_mapping);
        self.tone_mapping
            .run(&mut encoder, &self.targets, slot, &surface_view);

        if let Some(overlay) = overlay.as_deref_mut() {
            overlay.prepare(device, queue);
            overlay.draw(&mut encoder, &surface_view);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        // 周期性清理长期未使用的 GPU 资源
        if self.resources.frame_index() % 60 == 0 {
            self.resources.prune(600);
        }

        Ok(())
    }
}
