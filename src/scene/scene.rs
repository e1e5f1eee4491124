use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Vec3, Vec4};
use slotmap::SlotMap;
use thunderdome::Arena;

use crate::resources::dof::DofSettings;
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::resources::mesh::Mesh;
use crate::resources::texture::Texture;
use crate::resources::{BloomSettings, ToneMappingSettings};
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::node::Node;

use crate::scene::{CameraKey, GeometryKey, LightKey, MaterialKey, MeshKey, NodeIndex, TextureKey};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// 场景图结构
///
/// Scene 是纯数据层：节点层级、组件池（Mesh/Camera/Light）、资源池
/// （Material/Geometry/Texture），以及后处理设置。渲染器每帧读取这些
/// 数据，不在这里做任何 GPU 操作。
pub struct Scene {
    pub id: u32,

    pub nodes: Arena<Node>,
    pub root_nodes: Vec<NodeIndex>,

    // ====组件池====
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub cameras: SlotMap<CameraKey, Camera>,
    pub lights: SlotMap<LightKey, Light>,

    // ====资源池====
    pub materials: SlotMap<MaterialKey, Material>,
    pub geometries: SlotMap<GeometryKey, Geometry>,
    pub textures: SlotMap<TextureKey, Texture>,

    // 暂时简单用 RGBA 清屏色，后面可以扩展为 Texture 背景
    pub background: Option<Vec4>,

    pub active_camera: Option<NodeIndex>,

    // ====后处理设置====
    // GUI 面板直接修改这些字段，渲染 Pass 每帧读取
    pub bloom: BloomSettings,
    pub tone_mapping: ToneMappingSettings,
    pub dof: DofSettings,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),

            nodes: Arena::new(),
            root_nodes: Vec::new(),
            meshes: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            lights: SlotMap::with_key(),

            materials: SlotMap::with_key(),
            geometries: SlotMap::with_key(),
            textures: SlotMap::with_key(),

            background: Some(Vec4::new(0.0, 0.0, 0.0, 1.0)),

            active_camera: None,

            bloom: BloomSettings::default(),
            tone_mapping: ToneMappingSettings::default(),
            dof: DofSettings::default(),
        }
    }

    // ========================================================================
    // 节点管理
    // ========================================================================

    /// 开始构建一个节点
    pub fn build_node(&'_ mut self, name: &str) -> NodeBuilder<'_> {
        NodeBuilder::new(self, name)
    }

    /// 添加一个节点到场景 (默认放在根节点)
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let idx = self.nodes.insert(node);
        self.root_nodes.push(idx);
        idx
    }

    pub fn add_to_parent(&mut self, child: Node, parent_idx: NodeIndex) -> NodeIndex {
        let idx = self.nodes.insert(child);

        if let Some(p) = self.nodes.get_mut(parent_idx) {
            p.children.push(idx);
        }
        if let Some(c) = self.nodes.get_mut(idx) {
            c.parent = Some(parent_idx);
        }

        idx
    }

    /// 移除节点 (递归移除所有子节点及其组件)
    pub fn remove_node(&mut self, idx: NodeIndex) {
        // 1. 先把 children 列表拿出来，避免借用冲突
        let children = if let Some(node) = self.nodes.get(idx) {
            node.children.clone()
        } else {
            return;
        };

        for child in children {
            self.remove_node(child);
        }

        // 2. 解除父子关系
        let parent_opt = self.nodes.get(idx).and_then(|n| n.parent);

        if let Some(parent_idx) = parent_opt {
            if let Some(parent) = self.nodes.get_mut(parent_idx)
                && let Some(pos) = parent.children.iter().position(|&x| x == idx)
            {
                parent.children.remove(pos);
            }
        } else if let Some(pos) = self.root_nodes.iter().position(|&x| x == idx) {
            self.root_nodes.remove(pos);
        }

        // 3. 清理组件
        if let Some(node) = self.nodes.get(idx) {
            if let Some(mesh_idx) = node.mesh {
                self.meshes.remove(mesh_idx);
            }
            if let Some(cam_idx) = node.camera {
                self.cameras.remove(cam_idx);
            }
            if let Some(light_idx) = node.light {
                self.lights.remove(light_idx);
            }
        }

        if self.active_camera == Some(idx) {
            self.active_camera = None;
        }

        self.nodes.remove(idx);
    }

    /// 核心逻辑：建立父子关系 (Attach)
    pub fn attach(&mut self, child_idx: NodeIndex, parent_idx: NodeIndex) {
        if child_idx == parent_idx {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        // 1. Detach from old
        let old_parent = self.nodes.get(child_idx).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child_idx)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child_idx) {
            self.root_nodes.remove(i);
        }

        // 2. Attach to new
        if let Some(p) = self.nodes.get_mut(parent_idx) {
            p.children.push(child_idx);
        } else {
            log::error!("Parent node not found during attach!");
            self.root_nodes.push(child_idx);
            return;
        }

        // 3. Update child
        if let Some(c) = self.nodes.get_mut(child_idx) {
            c.parent = Some(parent_idx);
            c.transform.mark_dirty();
        }
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(idx)
    }

    /// Depth-first search for the first node with the given name.
    ///
    /// Matches the lookup used for model sub-parts: tree order from the
    /// root nodes, first hit wins.
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeIndex> {
        let mut stack: Vec<NodeIndex> = self.root_nodes.iter().rev().copied().collect();

        while let Some(idx) = stack.pop() {
            let node = self.nodes.get(idx)?;
            if node.name.as_deref() == Some(name) {
                return Some(idx);
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }

        None
    }

    // ========================================================================
    // 组件 / 资源管理 API
    // ========================================================================

    pub fn insert_mesh(&mut self, mesh: Mesh) -> MeshKey {
        self.meshes.insert(mesh)
    }

    pub fn insert_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn insert_geometry(&mut self, geometry: Geometry) -> GeometryKey {
        self.geometries.insert(geometry)
    }

    pub fn insert_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    /// 创建一个挂载 Mesh 的节点 (默认放在根节点)
    pub fn add_mesh(&mut self, mesh: Mesh) -> NodeIndex {
        let mut node = Node::new();
        node.name = Some(mesh.name.clone());
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_node(node)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeIndex {
        let mut node = Node::new();
        node.name = Some("Camera".to_string());
        node.camera = Some(self.cameras.insert(camera));
        self.add_node(node)
    }

    pub fn add_light(&mut self, light: Light) -> NodeIndex {
        let mut node = Node::new();
        node.name = Some("Light".to_string());
        node.light = Some(self.lights.insert(light));
        self.add_node(node)
    }

    pub fn add_light_to_parent(&mut self, light: Light, parent: NodeIndex) -> NodeIndex {
        let mut node = Node::new();
        node.name = Some("Light".to_string());
        node.light = Some(self.lights.insert(light));
        self.add_to_parent(node, parent)
    }

    /// 迭代所有可见的灯光及其世界矩阵
    pub fn iter_active_lights(&self) -> impl Iterator<Item = (&Light, &Affine3A)> {
        self.nodes.iter().filter_map(|(_, node)| {
            if !node.visible {
                return None;
            }
            let light_key = node.light?;
            let light = self.lights.get(light_key)?;
            Some((light, &node.transform.world_matrix))
        })
    }

    // ========================================================================
    // 相机查询
    // ========================================================================

    pub fn main_camera_node(&self) -> Option<&Node> {
        let id = self.active_camera?;
        self.get_node(id)
    }

    pub fn main_camera_node_mut(&mut self) -> Option<&mut Node> {
        let id = self.active_camera?;
        self.get_node_mut(id)
    }

    /// 获取主相机组件的可变引用 (用于修改投影参数)
    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        let node_id = self.active_camera?;
        let camera_key = self.nodes.get(node_id)?.camera?;
        self.cameras.get_mut(camera_key)
    }

    pub fn main_camera(&self) -> Option<&Camera> {
        let node_id = self.active_camera?;
        let camera_key = self.nodes.get(node_id)?.camera?;
        self.cameras.get(camera_key)
    }

    // ========================================================================
    // 矩阵更新流水线
    // ========================================================================

    /// 更新整个场景的世界矩阵，并刷新相机的视图矩阵。
    /// 这是每帧渲染前必须调用的。
    pub fn update_matrix_world(&mut self) {
        // 使用显式栈的迭代版本，避免深层级场景的栈溢出
        let mut stack: Vec<(NodeIndex, Affine3A, bool)> = self
            .root_nodes
            .iter()
            .map(|&idx| (idx, Affine3A::IDENTITY, false))
            .collect();

        while let Some((idx, parent_world, parent_dirty)) = stack.pop() {
            let (world, subtree_dirty, child_count) = {
                let Some(node) = self.nodes.get_mut(idx) else {
                    continue;
                };

                let local_changed = node.transform.update_local_matrix();
                let dirty = parent_dirty || local_changed;
                if dirty {
                    let world = parent_world * *node.transform.local_matrix();
                    node.transform.set_world_matrix(world);
                }

                (node.transform.world_matrix, dirty, node.children.len())
            };

            for i in 0..child_count {
                if let Some(node) = self.nodes.get(idx) {
                    stack.push((node.children[i], world, subtree_dirty));
                }
            }
        }

        self.sync_camera_views();
    }

    /// 更新场景状态（每帧调用）
    pub fn update(&mut self) {
        self.update_matrix_world();
    }

    /// 世界位置查询 (用于对焦距离等 CPU 端逻辑)
    #[must_use]
    pub fn world_position(&self, idx: NodeIndex) -> Option<Vec3> {
        self.nodes
            .get(idx)
            .map(|n| n.transform.world_matrix.translation.into())
    }

    fn sync_camera_views(&mut self) {
        // 相机的视图矩阵从节点世界矩阵推导
        for (_, node) in &self.nodes {
            if let Some(camera_key) = node.camera
                && let Some(camera) = self.cameras.get_mut(camera_key)
            {
                camera.update_view_projection(&node.transform.world_matrix);
            }
        }
    }
}

/// 链式节点构造器
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    node: Node,
    parent: Option<NodeIndex>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        let mut node = Node::new();
        if !name.is_empty() {
            node.name = Some(name.to_string());
        }
        Self {
            scene,
            node,
            parent: None,
        }
    }

    // === 链式配置方法 ===

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.node.transform.position = Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.node.transform.scale = Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeIndex) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 关联 Mesh (传入 Mesh 句柄)
    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshKey) -> Self {
        self.node.mesh = Some(mesh);
        self
    }

    /// 设置层掩码通道
    #[must_use]
    pub fn on_layer(mut self, channel: u32) -> Self {
        self.node.layers.enable(channel);
        self
    }

    // === 终结方法 ===

    /// 完成构建，将 Node 插入 Scene，返回 Index
    pub fn build(self) -> NodeIndex {
        let node_idx = self.scene.nodes.insert(self.node);

        if let Some(parent_idx) = self.parent {
            self.scene.attach(node_idx, parent_idx);
        } else {
            self.scene.root_nodes.push(node_idx);
        }

        node_idx
    }
}
