//! 核心资源定义模块
//!
//! 包含渲染所需的核心数据结构，不依赖于 GPU 实现：
//! - Mesh: 网格对象
//! - Material: 材质定义
//! - Texture: 纹理数据
//! - Geometry: 几何数据
//! - Buffer: 带版本追踪的 Uniform 缓冲
//! - Bloom / ToneMapping / Dof: 后处理设置

pub mod bloom;
pub mod buffer;
pub mod dof;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod texture;
pub mod tone_mapping;

// 重新导出常用类型
pub use bloom::BloomSettings;
pub use buffer::CpuBuffer;
pub use dof::DofSettings;
pub use geometry::{Attribute, BoundingBox, BoundingSphere, Geometry};
pub use material::{
    Material, MaterialData, MaterialKind, MaterialSettings, MeshBasicMaterial,
    MeshStandardMaterial, Side,
};
pub use mesh::Mesh;
pub use texture::{Texture, TextureSampler};
pub use tone_mapping::{ToneMappingMode, ToneMappingSettings};
