//! 景深通道
//!
//! 两个全屏阶段：先线性化深度算出带符号弥散圆写进 alpha (CoC)，
//! 再做黄金角环形散景聚集。输入在 post 缓冲间 ping-pong：
//! bloom 开启时 post_a → post_b → post_a，关闭时 scene_color → post_a → post_b。

use std::sync::Arc;

use crate::define_gpu_data_struct;
use crate::renderer::passes::bloom::{
    depth_texture_entry, fullscreen_pipeline, non_filtering_sampler_entry, run_fullscreen,
    sampler_entry, texture_entry, uniform_entry,
};
use crate::renderer::passes::ColorSlot;
use crate::renderer::targets::RenderTargets;
use crate::renderer::HDR_TEXTURE_FORMAT;
use crate::resources::buffer::CpuBuffer;
use crate::resources::dof::DofSettings;
use crate::scene::camera::Camera;

define_gpu_data_struct!(
    /// 深度线性化所需的投影参数。
    pub struct CameraUniforms {
        pub near: f32 = 0.1,
        pub far: f32 = 1000.0,
        pub aspect: f32 = 1.0,
        pub __pad: u32,
    }
);

struct DofBindGroups {
    coc_group: wgpu::BindGroup,
    bokeh_group: wgpu::BindGroup,

    generation: u64,
    input: ColorSlot,
    settings_buffer: Arc<wgpu::Buffer>,
}

pub struct DofPass {
    color_sampler: wgpu::Sampler,
    depth_sampler: wgpu::Sampler,

    coc_layout: wgpu::BindGroupLayout,
    bokeh_layout: wgpu::BindGroupLayout,

    coc_pipeline: wgpu::RenderPipeline,
    bokeh_pipeline: wgpu::RenderPipeline,

    camera_uniforms: CpuBuffer<CameraUniforms>,

    groups: Option<DofBindGroups>,
}

impl DofPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let color_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("DoF Color Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // 深度纹理只能用 non-filtering 采样器逐点读取
        let depth_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("DoF Depth Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let coc_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DoF CoC Layout"),
            entries: &[
                texture_entry(0),
                depth_texture_entry(1),
                sampler_entry(2),
                non_filtering_sampler_entry(3),
                uniform_entry(4),
                uniform_entry(5),
            ],
        });

        let bokeh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DoF Bokeh Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2),
                uniform_entry(3),
            ],
        });

        let fullscreen = include_str!("../shaders/fullscreen.wgsl");
        let coc_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("DoF CoC Shader"),
            source: wgpu::ShaderSource::Wgsl(
                format!("{fullscreen}\n{}", include_str!("../shaders/dof_coc.wgsl")).into(),
            ),
        });
        let bokeh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("DoF Bokeh Shader"),
            source: wgpu::ShaderSource::Wgsl(
                format!("{fullscreen}\n{}", include_str!("../shaders/dof_bokeh.wgsl")).into(),
            ),
        });

        let coc_pipeline =
            fullscreen_pipeline(device, "DoF CoC", &coc_shader, &coc_layout, HDR_TEXTURE_FORMAT, None);
        let bokeh_pipeline =
            fullscreen_pipeline(device, "DoF Bokeh", &bokeh_shader, &bokeh_layout, HDR_TEXTURE_FORMAT, None);

        Self {
            color_sampler,
            depth_sampler,
            coc_layout,
            bokeh_layout,
            coc_pipeline,
            bokeh_pipeline,
            camera_uniforms: CpuBuffer::new(
                CameraUniforms::default(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("DoF Camera Uniforms"),
            ),
            groups: None,
        }
    }

    /// 输入槽位 → 两次 ping-pong 后的输出槽位。
    #[must_use]
    pub fn output_slot(input: ColorSlot) -> ColorSlot {
        match input {
            ColorSlot::SceneColor => ColorSlot::PostB,
            ColorSlot::PostA => ColorSlot::PostA,
            ColorSlot::PostB => ColorSlot::PostB,
        }
    }

    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        targets: &RenderTargets,
        input: ColorSlot,
        camera: &Camera,
        settings: &mut DofSettings,
    ) {
        {
            let mut cam = self.camera_uniforms.write();
            cam.near = camera.near;
            cam.far = camera.far;
            cam.aspect = camera.aspect;
        }
        let camera_buffer = self.camera_uniforms.sync(device, queue).clone();
        let settings_buffer = settings.uniforms.sync(device, queue).clone();

        let up_to_date = self.groups.as_ref().is_some_and(|g| {
            g.generation == targets.generation()
                && g.input == input
                && Arc::ptr_eq(&g.settings_buffer, &settings_buffer)
        });
        if up_to_date {
            return;
        }

        let (input_view, coc_view, _) = Self::route(targets, input);

        let coc_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DoF CoC BindGroup"),
            layout: &self.coc_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(targets.depth()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.color_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.depth_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: settings_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: camera_buffer.as_entire_binding(),
                },
            ],
        });

        let bokeh_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DoF Bokeh BindGroup"),
            layout: &self.bokeh_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(coc_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.color_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: settings_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: camera_buffer.as_entire_binding(),
                },
            ],
        });

        self.groups = Some(DofBindGroups {
            coc_group,
            bokeh_group,
            generation: targets.generation(),
            input,
            settings_buffer,
        });
    }

    /// Records both stages and returns the slot holding the result.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        input: ColorSlot,
    ) -> ColorSlot {
        let Some(groups) = &self.groups else {
            return input;
        };

        let (_, coc_view, bokeh_view) = Self::route(targets, input);

        run_fullscreen(
            encoder,
            "DoF CoC",
            &self.coc_pipeline,
            &groups.coc_group,
            coc_view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
        run_fullscreen(
            encoder,
            "DoF Bokeh",
            &self.bokeh_pipeline,
            &groups.bokeh_group,
            bokeh_view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );

        Self::output_slot(input)
    }

    /// 输入视图、CoC 中间目标、散景最终目标。
    fn route(
        targets: &RenderTargets,
        input: ColorSlot,
    ) -> (&wgpu::TextureView, &wgpu::TextureView, &wgpu::TextureView) {
        match input {
            ColorSlot::SceneColor => (targets.scene_color(), targets.post_a(), targets.post_b()),
            ColorSlot::PostA => (targets.post_a(), targets.post_b(), targets.post_a()),
            ColorSlot::PostB => (targets.post_b(), targets.post_a(), targets.post_b()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_lands_where_the_renderer_expects() {
        // bloom 关闭：scene_color → post_a (CoC) → post_b
        assert_eq!(DofPass::output_slot(ColorSlot::SceneColor), ColorSlot::PostB);
        // bloom 开启：post_a → post_b (CoC) → post_a
        assert_eq!(DofPass::output_slot(ColorSlot::PostA), ColorSlot::PostA);
    }
}
