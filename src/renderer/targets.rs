//! Frame Render Targets
//!
//! Owns the offscreen textures the frame pipeline writes to:
//!
//! - `scene_color`: full forward render of the scene (HDR)
//! - `bloom_source`: masked forward render, bloom contributors only (HDR)
//! - `post_a` / `post_b`: post-processing ping-pong buffers (HDR)
//! - `depth`: shared depth buffer, sampleable for depth of field
//!
//! Everything here is recreated on resize and nowhere else.

use crate::renderer::HDR_TEXTURE_FORMAT;

struct ColorTarget {
    view: wgpu::TextureView,
}

impl ColorTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

pub struct RenderTargets {
    pub width: u32,
    pub height: u32,
    pub depth_format: wgpu::TextureFormat,

    scene_color: ColorTarget,
    bloom_source: ColorTarget,
    post_a: ColorTarget,
    post_b: ColorTarget,

    depth_view: wgpu::TextureView,

    /// Bumped on every reallocation so passes can drop stale bind groups.
    generation: u64,
}

impl RenderTargets {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            depth_format,
            scene_color: ColorTarget::new(device, width, height, "Scene Color"),
            bloom_source: ColorTarget::new(device, width, height, "Bloom Source"),
            post_a: ColorTarget::new(device, width, height, "Post A"),
            post_b: ColorTarget::new(device, width, height, "Post B"),
            depth_view: Self::create_depth(device, width, height, depth_format),
            generation: 1,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.scene_color = ColorTarget::new(device, width, height, "Scene Color");
        self.bloom_source = ColorTarget::new(device, width, height, "Bloom Source");
        self.post_a = ColorTarget::new(device, width, height, "Post A");
        self.post_b = ColorTarget::new(device, width, height, "Post B");
        self.depth_view = Self::create_depth(device, width, height, self.depth_format);
        self.generation = self.generation.wrapping_add(1);
    }

    fn create_depth(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    #[inline]
    #[must_use]
    pub fn scene_color(&self) -> &wgpu::TextureView {
        &self.scene_color.view
    }

    #[inline]
    #[must_use]
    pub fn bloom_source(&self) -> &wgpu::TextureView {
        &self.bloom_source.view
    }

    #[inline]
    #[must_use]
    pub fn post_a(&self) -> &wgpu::TextureView {
        &self.post_a.view
    }

    #[inline]
    #[must_use]
    pub fn post_b(&self) -> &wgpu::TextureView {
        &self.post_b.view
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
