//! Scene Graph Tests
//!
//! Tests for:
//! - World matrix propagation through the hierarchy
//! - Depth-first name lookup order
//! - Node removal and component cleanup
//! - Camera aspect updates after a resize
//! - Bloom mip-chain sizing for common window sizes

use glam::{Vec3, Vec4};

use halo::renderer::passes::bloom::bloom_mip_count;
use halo::resources::{Material, Mesh, MeshBasicMaterial};
use halo::scene::{Node, NodeIndex, Scene};
use halo::Camera;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn named_node(scene: &mut Scene, name: &str, parent: Option<NodeIndex>) -> NodeIndex {
    let mut builder = scene.build_node(name);
    if let Some(parent) = parent {
        builder = builder.with_parent(parent);
    }
    builder.build()
}

// ============================================================================
// Hierarchy and transforms
// ============================================================================

#[test]
fn world_matrix_composes_parent_and_child() {
    let mut scene = Scene::new();

    let parent = scene.build_node("parent").with_position(1.0, 0.0, 0.0).build();
    let child = scene
        .build_node("child")
        .with_position(0.0, 2.0, 0.0)
        .with_parent(parent)
        .build();

    scene.update_matrix_world();

    let world = scene.world_position(child).unwrap();
    assert!(approx(world.x, 1.0));
    assert!(approx(world.y, 2.0));
    assert!(approx(world.z, 0.0));
}

#[test]
fn scale_propagates_to_children() {
    let mut scene = Scene::new();

    let parent = scene.build_node("parent").with_scale(0.5).build();
    let child = scene
        .build_node("child")
        .with_position(2.0, 0.0, 0.0)
        .with_parent(parent)
        .build();

    scene.update_matrix_world();

    let world = scene.world_position(child).unwrap();
    assert!(approx(world.x, 1.0));
}

#[test]
fn find_node_by_name_is_depth_first() {
    let mut scene = Scene::new();

    // 第一棵树深处藏一个 target，第二棵树根上也有一个
    let root_a = named_node(&mut scene, "a", None);
    let inner = named_node(&mut scene, "a.inner", Some(root_a));
    let deep_target = named_node(&mut scene, "target", Some(inner));

    let root_b = named_node(&mut scene, "b", None);
    let shallow_target = named_node(&mut scene, "target", Some(root_b));

    // 树序优先：第一棵树的命中在前，哪怕它更深
    assert_eq!(scene.find_node_by_name("target"), Some(deep_target));
    assert_ne!(scene.find_node_by_name("target"), Some(shallow_target));
    assert_eq!(scene.find_node_by_name("missing"), None);
}

#[test]
fn remove_node_drops_subtree_and_components() {
    let mut scene = Scene::new();

    let material = scene.insert_material(Material::from(MeshBasicMaterial::new(Vec4::ONE)));
    let geometry = scene.insert_geometry(halo::create_box(1.0, 1.0, 1.0));
    let mesh = scene.insert_mesh(Mesh::new("cube", geometry, material));

    let parent = scene.build_node("parent").build();
    let mut child = Node::new();
    child.mesh = Some(mesh);
    let child = scene.add_to_parent(child, parent);

    assert_eq!(scene.meshes.len(), 1);

    scene.remove_node(parent);

    assert!(scene.get_node(parent).is_none());
    assert!(scene.get_node(child).is_none());
    assert_eq!(scene.meshes.len(), 0);
}

// ============================================================================
// Resize: camera aspect and mip-chain sizing
// ============================================================================

#[test]
fn camera_aspect_updates_projection() {
    let mut camera = Camera::new_perspective(45.0, 800.0 / 600.0, 0.1, 1000.0);
    let before = camera.projection_matrix();

    camera.set_aspect(1920.0 / 1080.0);
    let after = camera.projection_matrix();

    assert!(approx(camera.aspect, 1920.0 / 1080.0));
    assert!(!approx(before.x_axis.x, after.x_axis.x));

    // 透视投影的 m00 = 1 / (aspect * tan(fov/2))
    let expected = 1.0 / (camera.aspect * (camera.fov * 0.5).tan());
    assert!(approx(after.x_axis.x, expected));

    // 纵向缩放只依赖 fov，不随 aspect 变
    assert!(approx(before.y_axis.y, after.y_axis.y));
}

#[test]
fn look_at_points_camera_at_target() {
    let mut scene = Scene::new();

    let camera_node = scene.add_camera(Camera::new_perspective(45.0, 1.0, 0.1, 1000.0));
    if let Some(node) = scene.get_node_mut(camera_node) {
        node.transform.position = Vec3::new(0.0, 0.0, 9.0);
        node.transform.look_at(Vec3::ZERO, Vec3::Y);
    }
    scene.active_camera = Some(camera_node);
    scene.update_matrix_world();

    let camera = scene.main_camera().unwrap();
    assert!(approx(camera.position().z, 9.0));

    // 原点投影到裁剪空间中心
    let clip = camera.view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!(approx(clip.x / clip.w, 0.0));
    assert!(approx(clip.y / clip.w, 0.0));
}

#[test]
fn mip_chain_grows_with_the_window() {
    // 半分辨率链：800×600 最多放 9 层，1920×1080 放 10 层
    assert_eq!(bloom_mip_count(800, 600, 16), 9);
    assert_eq!(bloom_mip_count(1920, 1080, 16), 10);

    // 设置里的上限仍然生效
    assert_eq!(bloom_mip_count(1920, 1080, 5), 5);
}
