//! Forward Pipeline Cache
//!
//! Render pipelines are keyed by material kind plus the pipeline-affecting
//! material settings. The vertex layout is fixed (planar position/normal/uv
//! buffers), the color target is always the HDR format, so the key space
//! stays tiny and lookups are cheap enough to do per draw call.

use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::renderer::HDR_TEXTURE_FORMAT;
use crate::resources::material::{MaterialData, MaterialKind, Side};

bitflags! {
    /// Pipeline-affecting state bits derived from material settings.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PipelineFlags: u32 {
        const TRANSPARENT  = 1 << 0;
        const DEPTH_WRITE  = 1 << 1;
        const DEPTH_TEST   = 1 << 2;
        const CULL_BACK    = 1 << 3;
        const CULL_FRONT   = 1 << 4;
    }
}

impl PipelineFlags {
    /// Collapses material settings into flag bits.
    #[must_use]
    pub fn from_material(material: &MaterialData) -> Self {
        let settings = material.settings();
        let mut flags = Self::empty();
        if settings.transparent {
            flags |= Self::TRANSPARENT;
        }
        if settings.depth_write {
            flags |= Self::DEPTH_WRITE;
        }
        if settings.depth_test {
            flags |= Self::DEPTH_TEST;
        }
        match settings.side {
            Side::Front => flags |= Self::CULL_BACK,
            Side::Back => flags |= Self::CULL_FRONT,
            Side::Double => {}
        }
        flags
    }

    #[must_use]
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        if self.contains(Self::CULL_BACK) {
            Some(wgpu::Face::Back)
        } else if self.contains(Self::CULL_FRONT) {
            Some(wgpu::Face::Front)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub kind: MaterialKind,
    pub flags: PipelineFlags,
}

impl PipelineKey {
    #[must_use]
    pub fn for_material(material: &MaterialData) -> Self {
        Self {
            kind: material.kind(),
            flags: PipelineFlags::from_material(material),
        }
    }
}

/// Caches forward render pipelines by [`PipelineKey`].
///
/// 两种材质的 uniform 结构不同，所以各自拼接独立的 shader module：
/// 公共块（全局绑定 + 顶点阶段）+ 材质专属的片元块。
pub struct PipelineCache {
    basic_shader: wgpu::ShaderModule,
    standard_shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    depth_format: wgpu::TextureFormat,
    pipelines: FxHashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
}

impl PipelineCache {
    pub fn new(
        device: &wgpu::Device,
        depth_format: wgpu::TextureFormat,
        global_layout: &wgpu::BindGroupLayout,
        material_layout: &wgpu::BindGroupLayout,
        object_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let common = include_str!("shaders/forward_common.wgsl");

        let basic_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Forward Basic Shader"),
            source: wgpu::ShaderSource::Wgsl(
                format!("{common}\n{}", include_str!("shaders/forward_basic.wgsl")).into(),
            ),
        });

        let standard_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Forward Standard Shader"),
            source: wgpu::ShaderSource::Wgsl(
                format!("{common}\n{}", include_str!("shaders/forward_standard.wgsl")).into(),
            ),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[Some(global_layout), Some(material_layout), Some(object_layout)],
            immediate_size: 0,
        });

        Self {
            basic_shader,
            standard_shader,
            layout,
            depth_format,
            pipelines: FxHashMap::default(),
        }
    }

    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        key: PipelineKey,
    ) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(&key) {
            return pipeline.clone();
        }

        let pipeline = Arc::new(self.build(device, key));
        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }

    fn build(&self, device: &wgpu::Device, key: PipelineKey) -> wgpu::RenderPipeline {
        let shader = match key.kind {
            MaterialKind::Basic => &self.basic_shader,
            MaterialKind::Standard => &self.standard_shader,
        };

        let blend = if key.flags.contains(PipelineFlags::TRANSPARENT) {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            None
        };

        // 平面 (planar) 顶点布局：position / normal / uv 各占一个槽位
        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![1 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: 8,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![2 => Float32x2],
            },
        ];

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Forward Pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_TEXTURE_FORMAT,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.flags.cull_mode(),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.depth_format,
                depth_write_enabled: Some(key.flags.contains(PipelineFlags::DEPTH_WRITE)),
                depth_compare: Some(if key.flags.contains(PipelineFlags::DEPTH_TEST) {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                }),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}
