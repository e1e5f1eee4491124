use glam::{Vec3, Vec4};

use crate::define_gpu_data_struct;
use crate::resources::buffer::{BufferGuard, CpuBuffer};
use crate::resources::material::MaterialSettings;
use crate::scene::TextureKey;

define_gpu_data_struct!(
    /// Uniform block for the lit shader.
    ///
    /// `emissive.w` carries the emissive intensity, `params` packs
    /// (metalness, roughness) in x/y.
    pub struct MeshStandardUniforms {
        pub color: Vec4 = Vec4::ONE,
        pub emissive: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0),
        pub params: Vec4 = Vec4::new(0.0, 1.0, 0.0, 0.0),
    }
);

// MeshStandardMaterial
// ----------------------------------------------------------------------------

/// Lit material with a metalness/roughness parameterization.
///
/// Emissive color is added after lighting and scaled by the emissive
/// intensity, which lets meshes push HDR values past 1.0 into the bloom
/// threshold range.
#[derive(Debug, Clone)]
pub struct MeshStandardMaterial {
    pub(crate) uniforms: CpuBuffer<MeshStandardUniforms>,
    map: Option<TextureKey>,
    settings: MaterialSettings,

    binding_version: u64,
}

impl MeshStandardMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        let uniform_data = MeshStandardUniforms {
            color,
            ..Default::default()
        };

        Self {
            uniforms: CpuBuffer::new(
                uniform_data,
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("MeshStandardUniforms"),
            ),
            map: None,
            settings: MaterialSettings::default(),
            binding_version: 0,
        }
    }

    pub fn uniforms_mut(&mut self) -> BufferGuard<'_, MeshStandardUniforms> {
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

    pub fn set_emissive(&mut self, emissive: Vec3) {
        let mut u = self.uniforms.write();
        u.emissive.x = emissive.x;
        u.emissive.y = emissive.y;
        u.emissive.z = emissive.z;
    }

    pub fn set_emissive_intensity(&mut self, intensity: f32) {
        self.uniforms.write().emissive.w = intensity;
    }

    pub fn set_metalness(&mut self, metalness: f32) {
        self.uniforms.write().params.x = metalness.clamp(0.0, 1.0);
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.uniforms.write().params.y = roughness.clamp(0.045, 1.0);
    }

    pub fn set_map(&mut self, texture: Option<TextureKey>) {
        if self.map != texture {
            self.map = texture;
            self.binding_version = self.binding_version.wrapping_add(1);
        }
    }
}

impl Default for MeshStandardMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}
