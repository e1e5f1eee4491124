mod basic;
mod standard;

pub use basic::MeshBasicMaterial;
pub use standard::MeshStandardMaterial;

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use glam::Vec4;
use uuid::Uuid;

use crate::scene::TextureKey;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// 材质设置 - 对应 Pipeline 变化
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MaterialSettings {
    pub transparent: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub side: Side,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            transparent: false,
            depth_write: true,
            depth_test: true,
            side: Side::Double,
        }
    }
}

/// Shading model selector, used as part of the pipeline cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Basic,
    Standard,
}

/// 材质数据枚举
///
/// 内置材质静态分发。每个变体自带 uniform 数据和绑定信息，
/// 渲染器按需同步到 GPU。
#[derive(Debug, Clone)]
pub enum MaterialData {
    Basic(MeshBasicMaterial),
    Standard(MeshStandardMaterial),
}

impl MaterialData {
    #[must_use]
    pub fn kind(&self) -> MaterialKind {
        match self {
            Self::Basic(_) => MaterialKind::Basic,
            Self::Standard(_) => MaterialKind::Standard,
        }
    }

    pub fn settings(&self) -> &MaterialSettings {
        match self {
            Self::Basic(m) => m.settings(),
            Self::Standard(m) => m.settings(),
        }
    }

    pub fn uniform_version(&self) -> u64 {
        match self {
            Self::Basic(m) => m.uniforms.version(),
            Self::Standard(m) => m.uniforms.version(),
        }
    }

    /// Color/base map, shared bind slot for both material kinds.
    pub fn map(&self) -> Option<TextureKey> {
        match self {
            Self::Basic(m) => m.map(),
            Self::Standard(m) => m.map(),
        }
    }

    /// Bumped whenever the texture bindings change.
    pub fn binding_version(&self) -> u64 {
        match self {
            Self::Basic(m) => m.binding_version(),
            Self::Standard(m) => m.binding_version(),
        }
    }

    /// Syncs the uniform block to the GPU and returns its buffer.
    pub fn sync_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> &Arc<wgpu::Buffer> {
        match self {
            Self::Basic(m) => m.uniforms.sync(device, queue),
            Self::Standard(m) => m.uniforms.sync(device, queue),
        }
    }

    /// Base color, dispatched per variant.
    pub fn set_color(&mut self, color: Vec4) {
        match self {
            Self::Basic(m) => m.set_color(color),
            Self::Standard(m) => m.set_color(color),
        }
    }

    #[must_use]
    pub fn color(&self) -> Vec4 {
        match self {
            Self::Basic(m) => m.uniforms.read().color,
            Self::Standard(m) => m.uniforms.read().color,
        }
    }
}

/// Material resource: identity plus shading data.
#[derive(Debug, Clone)]
pub struct Material {
    pub uuid: Uuid,
    pub name: Option<Cow<'static, str>>,
    pub data: MaterialData,
}

impl Material {
    pub fn new(data: impl Into<MaterialData>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Deref for Material {
    type Target = MaterialData;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Material {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl From<MeshBasicMaterial> for MaterialData {
    fn from(m: MeshBasicMaterial) -> Self {
        Self::Basic(m)
    }
}

impl From<MeshStandardMaterial> for MaterialData {
    fn from(m: MeshStandardMaterial) -> Self {
        Self::Standard(m)
    }
}

impl From<MeshBasicMaterial> for Material {
    fn from(m: MeshBasicMaterial) -> Self {
        Self::new(MaterialData::Basic(m))
    }
}

impl From<MeshStandardMaterial> for Material {
    fn from(m: MeshStandardMaterial) -> Self {
        Self::new(MaterialData::Standard(m))
    }
}
