//! 场景图系统模块
//!
//! 管理场景层级结构和组件：
//! - Node: 场景节点（支持父子关系、变换和层掩码）
//! - Transform: 变换组件（位置、旋转、缩放）
//! - Scene: 场景容器（节点 + 组件池 + 资源池 + 后处理设置）
//! - Camera: 相机组件
//! - Light: 光源组件

pub mod camera;
pub mod layers;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use layers::Layers;
pub use light::{Light, LightKind};
pub use node::Node;
pub use scene::{NodeBuilder, Scene};
pub use transform::Transform;

use thunderdome::Index;
pub type NodeIndex = Index;

use slotmap::new_key_type;

new_key_type! {
    pub struct MeshKey;
    pub struct CameraKey;
    pub struct LightKey;
    pub struct MaterialKey;
    pub struct GeometryKey;
    pub struct TextureKey;
}
