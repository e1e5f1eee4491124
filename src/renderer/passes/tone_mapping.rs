//! 色调映射通道
//!
//! 后处理链的最后一段：从当前 HDR 槽位读取，做曝光缩放和色调曲线，
//! 写入 surface 格式的 swapchain 视图。模式切换只改 uniform，不重建管线。

use std::sync::Arc;

use crate::renderer::passes::bloom::{
    fullscreen_pipeline, run_fullscreen, sampler_entry, texture_entry, uniform_entry,
};
use crate::renderer::passes::ColorSlot;
use crate::renderer::targets::RenderTargets;
use crate::resources::ToneMappingSettings;

struct CachedGroup {
    bind_group: wgpu::BindGroup,

    generation: u64,
    input: ColorSlot,
    settings_buffer: Arc<wgpu::Buffer>,
}

pub struct ToneMappingPass {
    sampler: wgpu::Sampler,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    cached: Option<CachedGroup>,
}

impl ToneMappingPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ToneMapping Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ToneMapping Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });

        let fullscreen = include_str!("../shaders/fullscreen.wgsl");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ToneMapping Shader"),
            source: wgpu::ShaderSource::Wgsl(
                format!("{fullscreen}\n{}", include_str!("../shaders/tone_mapping.wgsl")).into(),
            ),
        });

        let pipeline =
            fullscreen_pipeline(device, "ToneMapping", &shader, &layout, surface_format, None);

        Self {
            sampler,
            layout,
            pipeline,
            cached: None,
        }
    }

    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        targets: &RenderTargets,
        input: ColorSlot,
        settings: &mut ToneMappingSettings,
    ) {
        let settings_buffer = settings.uniforms.sync(device, queue).clone();

        let up_to_date = self.cached.as_ref().is_some_and(|c| {
            c.generation == targets.generation()
                && c.input == input
                && Arc::ptr_eq(&c.settings_buffer, &settings_buffer)
        });
        if up_to_date {
            return;
        }

        let input_view = match input {
            ColorSlot::SceneColor => targets.scene_color(),
            ColorSlot::PostA => targets.post_a(),
            ColorSlot::PostB => targets.post_b(),
        };

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ToneMapping BindGroup"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: settings_buffer.as_entire_binding(),
                },
            ],
        });

        self.cached = Some(CachedGroup {
            bind_group,
            generation: targets.generation(),
            input,
            settings_buffer,
        });
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        _targets: &RenderTargets,
        _input: ColorSlot,
        surface_view: &wgpu::TextureView,
    ) {
        let Some(cached) = &self.cached else {
            return;
        };

        run_fullscreen(
            encoder,
            "ToneMapping",
            &self.pipeline,
            &cached.bind_group,
            surface_view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
    }
}
