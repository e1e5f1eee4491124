use crate::scene::{GeometryKey, MaterialKey};

/// Mesh component: a geometry/material pairing hosted by a scene node.
///
/// The `material` field is an assignment, not ownership. Effects that
/// need to redirect shading for a pass (the bloom mask does) swap this
/// key and restore it afterwards.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,

    // === 资源引用 ===
    pub geometry: GeometryKey,
    pub material: MaterialKey,

    // === 实例特定的渲染设置 ===
    pub visible: bool,

    // 绘制顺序 (Render Order)
    pub render_order: i32,
}

impl Mesh {
    pub fn new(name: impl Into<String>, geometry: GeometryKey, material: MaterialKey) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            visible: true,
            render_order: 0,
        }
    }
}
