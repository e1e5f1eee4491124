//! 辉光通道
//!
//! 半分辨率 mip 链上的经典 bloom：
//!
//! 1. prefilter：soft-knee 阈值提取，辉光源 → mip 0
//! 2. downsample：13-tap 逐级降采样，第一级可选 Karis average
//! 3. upsample：3×3 tent 滤波逐级回升，additive 混合累积
//! 4. composite：scene_color + mip 0 × strength → post_a
//!
//! Bind groups 按渲染目标代数缓存，窗口尺寸变化时整条链重建。

use std::sync::Arc;

use crate::define_gpu_data_struct;
use crate::renderer::targets::RenderTargets;
use crate::renderer::HDR_TEXTURE_FORMAT;
use crate::resources::BloomSettings;

define_gpu_data_struct!(
    /// Downsample 配置，Karis 开/关各一份常驻 buffer。
    pub struct DownsampleUniforms {
        pub use_karis_average: u32,
        pub __pad: [u32; 3],
    }
);

/// Mip count for a bloom chain over a `width` × `height` frame.
///
/// Level 0 is half resolution; every level must keep at least one texel.
#[must_use]
pub fn bloom_mip_count(width: u32, height: u32, max_levels: u32) -> u32 {
    let half = (width / 2).min(height / 2);
    if half == 0 {
        return 1;
    }
    let fit = 32 - half.leading_zeros(); // floor(log2(half)) + 1
    max_levels.clamp(1, fit.max(1))
}

struct MipChain {
    views: Vec<wgpu::TextureView>,
    prefilter_group: wgpu::BindGroup,
    /// `downsample_groups[i]` reads mip `i` and renders into mip `i + 1`.
    downsample_groups: Vec<wgpu::BindGroup>,
    /// `upsample_groups[i]` reads mip `i + 1` and renders into mip `i`.
    upsample_groups: Vec<wgpu::BindGroup>,
    composite_group: wgpu::BindGroup,

    generation: u64,
    karis_average: bool,
    prefilter_buffer: Arc<wgpu::Buffer>,
}

pub struct BloomPass {
    sampler: wgpu::Sampler,

    io_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,

    prefilter_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    karis_on: wgpu::Buffer,
    karis_off: wgpu::Buffer,

    chain: Option<MipChain>,
}

impl BloomPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // prefilter / downsample / upsample 共用：texture + sampler + uniform
        let io_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom IO Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2),
            ],
        });

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Composite Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                sampler_entry(2),
                uniform_entry(3),
            ],
        });

        let fullscreen = include_str!("../shaders/fullscreen.wgsl");
        let make_shader = |label: &str, body: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(format!("{fullscreen}\n{body}").into()),
            })
        };

        let prefilter_shader = make_shader(
            "Bloom Prefilter Shader",
            include_str!("../shaders/bloom_prefilter.wgsl"),
        );
        let downsample_shader = make_shader(
            "Bloom Downsample Shader",
            include_str!("../shaders/bloom_downsample.wgsl"),
        );
        let upsample_shader = make_shader(
            "Bloom Upsample Shader",
            include_str!("../shaders/bloom_upsample.wgsl"),
        );
        let composite_shader = make_shader(
            "Bloom Composite Shader",
            include_str!("../shaders/bloom_composite.wgsl"),
        );

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };

        let prefilter_pipeline =
            fullscreen_pipeline(device, "Bloom Prefilter", &prefilter_shader, &io_layout, HDR_TEXTURE_FORMAT, None);
        let downsample_pipeline =
            fullscreen_pipeline(device, "Bloom Downsample", &downsample_shader, &io_layout, HDR_TEXTURE_FORMAT, None);
        let upsample_pipeline = fullscreen_pipeline(
            device,
            "Bloom Upsample",
            &upsample_shader,
            &io_layout,
            HDR_TEXTURE_FORMAT,
            Some(additive),
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Bloom Composite",
            &composite_shader,
            &composite_layout,
            HDR_TEXTURE_FORMAT,
            None,
        );

        let make_karis = |label: &'static str, on: bool| {
            use wgpu::util::DeviceExt;
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&DownsampleUniforms {
                    use_karis_average: u32::from(on),
                    __pad: [0; 3],
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        };

        Self {
            sampler,
            io_layout,
            composite_layout,
            prefilter_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            composite_pipeline,
            karis_on: make_karis("Karis On", true),
            karis_off: make_karis("Karis Off", false),
            chain: None,
        }
    }

    /// Syncs the settings uniforms and (re)builds the mip chain when the
    /// render targets, the Karis flag, or the settings buffers changed.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        targets: &RenderTargets,
        settings: &mut BloomSettings,
    ) {
        let prefilter_buffer = settings.prefilter_uniforms.sync(device, queue).clone();
        let upsample_buffer = settings.upsample_uniforms.sync(device, queue).clone();
        let composite_buffer = settings.composite_uniforms.sync(device, queue).clone();

        let up_to_date = self.chain.as_ref().is_some_and(|chain| {
            chain.generation == targets.generation()
                && chain.karis_average == settings.karis_average
                && Arc::ptr_eq(&chain.prefilter_buffer, &prefilter_buffer)
        });
        if up_to_date {
            return;
        }

        self.chain = Some(self.build_chain(
            device,
            targets,
            settings,
            prefilter_buffer,
            &upsample_buffer,
            &composite_buffer,
        ));
    }

    /// Records the full bloom chain. `prepare` must have run this frame.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        _settings: &BloomSettings,
    ) {
        let Some(chain) = &self.chain else {
            return;
        };

        // 1. prefilter: bloom_source → mip 0
        run_fullscreen(
            encoder,
            "Bloom Prefilter",
            &self.prefilter_pipeline,
            &chain.prefilter_group,
            &chain.views[0],
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );

        // 2. 逐级降采样
        for (i, group) in chain.downsample_groups.iter().enumerate() {
            run_fullscreen(
                encoder,
                "Bloom Downsample",
                &self.downsample_pipeline,
                group,
                &chain.views[i + 1],
                wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            );
        }

        // 3. 逐级回升，additive 叠加到上一级
        for (i, group) in chain.upsample_groups.iter().enumerate().rev() {
            run_fullscreen(
                encoder,
                "Bloom Upsample",
                &self.upsample_pipeline,
                group,
                &chain.views[i],
                wgpu::LoadOp::Load,
            );
        }

        // 4. composite: scene_color + mip 0 → post_a
        run_fullscreen(
            encoder,
            "Bloom Composite",
            &self.composite_pipeline,
            &chain.composite_group,
            targets.post_a(),
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
    }

    fn build_chain(
        &self,
        device: &wgpu::Device,
        targets: &RenderTargets,
        settings: &BloomSettings,
        prefilter_buffer: Arc<wgpu::Buffer>,
        upsample_buffer: &wgpu::Buffer,
        composite_buffer: &wgpu::Buffer,
    ) -> MipChain {
        let levels = bloom_mip_count(targets.width, targets.height, settings.max_mip_levels());
        let width = (targets.width / 2).max(1);
        let height = (targets.height / 2).max(1);

        log::debug!("rebuilding bloom chain: {width}x{height}, {levels} levels");

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Bloom Mip Chain"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let views: Vec<wgpu::TextureView> = (0..levels)
            .map(|level| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Bloom Mip View"),
                    base_mip_level: level,
                    mip_level_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let io_group = |label: &str, view: &wgpu::TextureView, uniform: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.io_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform.as_entire_binding(),
                    },
                ],
            })
        };

        let prefilter_group = io_group("Bloom Prefilter BindGroup", targets.bloom_source(), &prefilter_buffer);

        let downsample_groups: Vec<wgpu::BindGroup> = (0..levels.saturating_sub(1))
            .map(|i| {
                let karis = if i == 0 && settings.karis_average {
                    &self.karis_on
                } else {
                    &self.karis_off
                };
                io_group("Bloom Downsample BindGroup", &views[i as usize], karis)
            })
            .collect();

        let upsample_groups: Vec<wgpu::BindGroup> = (0..levels.saturating_sub(1))
            .map(|i| io_group("Bloom Upsample BindGroup", &views[i as usize + 1], upsample_buffer))
            .collect();

        let composite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Composite BindGroup"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.scene_color()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: composite_buffer.as_entire_binding(),
                },
            ],
        });

        MipChain {
            views,
            prefilter_group,
            downsample_groups,
            upsample_groups,
            composite_group,
            generation: targets.generation(),
            karis_average: settings.karis_average,
            prefilter_buffer,
        }
    }
}

// ============================================================================
// 全屏通道辅助函数，同文件的 dof / tone mapping 也会用到
// ============================================================================

pub(super) fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(super) fn depth_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(super) fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

pub(super) fn non_filtering_sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
        count: None,
    }
}

pub(super) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// 全屏三角形管线：无顶点缓冲，单一颜色目标，无深度。
pub(super) fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[Some(layout)],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// 录制一个绑定单 bind group 的全屏通道。
pub(super) fn run_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    target: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_respects_target_size() {
        // 1280×720 → half 360 → floor(log2) + 1 = 9 levels available
        assert_eq!(bloom_mip_count(1280, 720, 5), 5);
        assert_eq!(bloom_mip_count(1280, 720, 16), 9);
    }

    #[test]
    fn tiny_targets_keep_at_least_one_level() {
        assert_eq!(bloom_mip_count(1, 1, 5), 1);
        assert_eq!(bloom_mip_count(2, 2, 5), 1);
        assert_eq!(bloom_mip_count(4, 4, 5), 2);
    }
}
