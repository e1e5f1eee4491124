use glam::Vec4;

use crate::define_gpu_data_struct;
use crate::resources::buffer::{BufferGuard, CpuBuffer};
use crate::resources::material::MaterialSettings;
use crate::scene::TextureKey;

define_gpu_data_struct!(
    /// Uniform block for the unlit shader.
    pub struct MeshBasicUniforms {
        pub color: Vec4 = Vec4::ONE,
    }
);

// MeshBasicMaterial
// ----------------------------------------------------------------------------

/// Unlit material. The fragment color is `color * map`, no lighting at all.
///
/// This is also what the bloom compositor uses for its darkening material:
/// a black basic material renders to pure black regardless of lights.
#[derive(Debug, Clone)]
pub struct MeshBasicMaterial {
    pub(crate) uniforms: CpuBuffer<MeshBasicUniforms>,
    map: Option<TextureKey>,
    settings: MaterialSettings,

    binding_version: u64,
}

impl MeshBasicMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        let uniform_data = MeshBasicUniforms { color };

        Self {
            uniforms: CpuBuffer::new(
                uniform_data,
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("MeshBasicUniforms"),
            ),
            map: None,
            settings: MaterialSettings::default(),
            binding_version: 0,
        }
    }

    pub fn uniforms_mut(&mut self) -> BufferGuard<'_, MeshBasicUniforms> {
        self.uniforms.write()
    }

    pub fn settings(&self) -> &MaterialSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut MaterialSettings {
        &mut self.settings
    }

    pub fn map(&self) -> Option<TextureKey> {
        self.map
    }

    pub fn binding_version(&self) -> u64 {
        self.binding_version
    }

    pub fn set_color(&mut self, color: Vec4) {
        self.uniforms.write().color = color;
    }

    pub fn set_map(&mut self, texture: Option<TextureKey>) {
        if self.map != texture {
            self.map = texture;
            self.binding_version = self.binding_version.wrapping_add(1);
        }
    }
}

impl Default for MeshBasicMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}
