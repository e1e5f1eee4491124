//! GPU 资源缓存
//!
//! Scene resources are plain CPU data; this module owns their GPU mirrors:
//! vertex/index buffers keyed by attribute id, textures keyed by uuid, and
//! material bind groups keyed by material uuid. Everything is version
//! checked, so unchanged resources cost a hash lookup per frame.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use uuid::Uuid;
use wgpu::util::DeviceExt;

use crate::resources::geometry::Attribute;
use crate::resources::material::Material;
use crate::resources::texture::Texture;
use crate::scene::TextureKey;

pub struct GpuAttribute {
    pub buffer: wgpu::Buffer,
    version: u64,
    capacity: u64,
    last_used_frame: u64,
}

pub struct GpuTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    texture: wgpu::Texture,
    version: u64,
    last_used_frame: u64,
}

pub struct GpuMaterial {
    pub bind_group: wgpu::BindGroup,
    last_binding_version: u64,
    last_map_uuid: Option<Uuid>,
    last_used_frame: u64,
}

pub struct ResourceManager {
    frame_index: u64,

    attributes: FxHashMap<u64, GpuAttribute>,
    textures: FxHashMap<Uuid, GpuTexture>,
    materials: FxHashMap<Uuid, GpuMaterial>,

    material_layout: wgpu::BindGroupLayout,

    // 1×1 白色占位贴图，材质没有贴图时绑定它
    fallback: GpuTexture,
}

impl ResourceManager {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let white = Texture::solid([255, 255, 255, 255]).with_name("White Fallback");
        let fallback = Self::create_texture(device, queue, &white);

        Self {
            frame_index: 0,
            attributes: FxHashMap::default(),
            textures: FxHashMap::default(),
            materials: FxHashMap::default(),
            material_layout,
            fallback,
        }
    }

    pub fn next_frame(&mut self) {
        self.frame_index += 1;
    }

    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[must_use]
    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    // ========================================================================
    // Attribute buffers
    // ========================================================================

    /// 如果不存在则创建，如果版本过期则更新。
    /// Recreates the buffer when the data outgrew the old allocation.
    pub fn prepare_attribute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        attr: &Attribute,
        usage: wgpu::BufferUsages,
    ) {
        let bytes = attr.bytes();

        if let Some(gpu) = self.attributes.get_mut(&attr.id) {
            gpu.last_used_frame = self.frame_index;
            if gpu.version == attr.version {
                return;
            }
            if bytes.len() as u64 <= gpu.capacity {
                queue.write_buffer(&gpu.buffer, 0, bytes);
                gpu.version = attr.version;
                return;
            }
            // 容量不足，走重建
        }

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: None,
            contents: bytes,
            usage: usage | wgpu::BufferUsages::COPY_DST,
        });

        self.attributes.insert(
            attr.id,
            GpuAttribute {
                buffer,
                version: attr.version,
                capacity: bytes.len() as u64,
                last_used_frame: self.frame_index,
            },
        );
    }

    #[must_use]
    pub fn attribute(&self, id: u64) -> Option<&GpuAttribute> {
        self.attributes.get(&id)
    }

    // ========================================================================
    // Textures
    // ========================================================================

    pub fn prepare_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &Texture) {
        if let Some(gpu) = self.textures.get_mut(&texture.uuid) {
            gpu.last_used_frame = self.frame_index;
            if gpu.version < texture.version {
                Self::upload_texture(queue, &gpu.texture, texture);
                gpu.version = texture.version;
            }
            return;
        }

        let mut gpu = Self::create_texture(device, queue, texture);
        gpu.last_used_frame = self.frame_index;
        self.textures.insert(texture.uuid, gpu);
    }

    fn create_texture(device: &wgpu::Device, queue: &wgpu::Queue, texture: &Texture) -> GpuTexture {
        let format = if texture.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: texture.name.as_deref(),
            size: wgpu::Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        Self::upload_texture(queue, &gpu_texture, texture);

        let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: texture.sampler.address_mode_u,
            address_mode_v: texture.sampler.address_mode_v,
            mag_filter: texture.sampler.mag_filter,
            min_filter: texture.sampler.min_filter,
            mipmap_filter: texture.sampler.mipmap_filter,
            ..Default::default()
        });

        GpuTexture {
            view,
            sampler,
            texture: gpu_texture,
            version: texture.version,
            last_used_frame: 0,
        }
    }

    fn upload_texture(queue: &wgpu::Queue, gpu_texture: &wgpu::Texture, texture: &Texture) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texture.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.width * 4),
                rows_per_image: Some(texture.height),
            },
            wgpu::Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
        );
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Syncs the material uniform buffer and rebuilds the bind group when the
    /// texture binding changed. Uniform-only edits reuse the cached group
    /// because the underlying `wgpu::Buffer` is stable.
    pub fn prepare_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material: &mut Material,
        textures: &SlotMap<TextureKey, Texture>,
    ) {
        let map_texture = material.map().and_then(|key| textures.get(key));
        if let Some(texture) = map_texture {
            self.prepare_texture(device, queue, texture);
        }
        let map_uuid = map_texture.map(|t| t.uuid);

        let binding_version = material.binding_version();
        if let Some(gpu) = self.materials.get_mut(&material.uuid) {
            gpu.last_used_frame = self.frame_index;
            if gpu.last_binding_version == binding_version && gpu.last_map_uuid == map_uuid {
                // 只需同步 uniform 内容
                material.sync_uniforms(device, queue);
                return;
            }
        }

        let uniform_buffer = material.sync_uniforms(device, queue).clone();
        let (view, sampler) = match map_uuid.and_then(|id| self.textures.get(&id)) {
            Some(gpu_tex) => (&gpu_tex.view, &gpu_tex.sampler),
            None => (&self.fallback.view, &self.fallback.sampler),
        };

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material BindGroup"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.materials.insert(
            material.uuid,
            GpuMaterial {
                bind_group,
                last_binding_version: binding_version,
                last_map_uuid: map_uuid,
                last_used_frame: self.frame_index,
            },
        );
    }

    #[must_use]
    pub fn material(&self, uuid: Uuid) -> Option<&GpuMaterial> {
        self.materials.get(&uuid)
    }

    // ========================================================================
    // Garbage Collection
    // ========================================================================

    /// Drops GPU resources not touched for `ttl_frames` frames.
    pub fn prune(&mut self, ttl_frames: u64) {
        if self.frame_index < ttl_frames {
            return;
        }
        let cutoff = self.frame_index - ttl_frames;

        self.attributes.retain(|_, v| v.last_used_frame >= cutoff);
        self.textures.retain(|_, v| v.last_used_frame >= cutoff);
        self.materials.retain(|_, v| v.last_used_frame >= cutoff);
    }
}
