//! Selective Bloom Compositor Tests
//!
//! Tests for:
//! - Two-phase mask protocol: swap to black, restore originals
//! - Protocol misuse (double begin, end without begin)
//! - Shared mesh components (keep-earliest policy)
//! - Meshes removed mid-pass and dark material recreation

use glam::Vec4;

use halo::renderer::selective::{BLOOM_LAYER, SelectiveBloom};
use halo::resources::{Material, Mesh, MeshBasicMaterial};
use halo::scene::{MaterialKey, MeshKey, Node, NodeIndex, Scene};
use halo::{Camera, HaloError, Light};

/// Adds a cube-ish mesh node with its own material. Returns the node, the
/// mesh component key and the original material key.
fn add_mesh_node(
    scene: &mut Scene,
    name: &str,
    on_bloom_layer: bool,
) -> (NodeIndex, MeshKey, MaterialKey) {
    let material = scene.insert_material(
        Material::from(MeshBasicMaterial::new(Vec4::new(0.5, 0.5, 0.5, 1.0)))
            .with_name(name.to_string()),
    );
    let geometry = scene.insert_geometry(halo::create_box(1.0, 1.0, 1.0));
    let mesh = scene.insert_mesh(Mesh::new(name, geometry, material));

    let mut builder = scene.build_node(name).with_mesh(mesh);
    if on_bloom_layer {
        builder = builder.on_layer(BLOOM_LAYER);
    }
    let node = builder.build();
    (node, mesh, material)
}

fn material_of(scene: &Scene, mesh: MeshKey) -> MaterialKey {
    scene.meshes[mesh].material
}

// ============================================================================
// Mask window semantics
// ============================================================================

#[test]
fn mask_darkens_only_non_members() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let (_, plain_mesh, plain_material) = add_mesh_node(&mut scene, "plain", false);
    let (_, glow_mesh, glow_material) = add_mesh_node(&mut scene, "glow", true);

    let stats = compositor.begin_mask_pass(&mut scene).unwrap();
    assert_eq!(stats.darkened, 1);
    assert_eq!(stats.preserved, 1);

    let dark = compositor.dark_material().unwrap();
    assert_eq!(material_of(&scene, plain_mesh), dark);
    assert_eq!(material_of(&scene, glow_mesh), glow_material);
    assert_ne!(dark, plain_material);

    compositor.end_mask_pass(&mut scene).unwrap();
}

#[test]
fn restore_round_trips_every_material() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let mut originals = Vec::new();
    for i in 0..5 {
        let (_, mesh, material) = add_mesh_node(&mut scene, &format!("mesh.{i}"), i % 2 == 0);
        originals.push((mesh, material));
    }

    compositor.begin_mask_pass(&mut scene).unwrap();
    compositor.end_mask_pass(&mut scene).unwrap();

    for (mesh, material) in originals {
        assert_eq!(material_of(&scene, mesh), material);
    }
    assert_eq!(compositor.saved_count(), 0);
}

#[test]
fn non_mesh_nodes_never_enter_the_table() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    scene.add_light(Light::new_ambient(glam::Vec3::ONE, 1.0));
    scene.add_camera(Camera::new_perspective(45.0, 1.0, 0.1, 1000.0));
    scene.add_node(Node::new()); // empty group
    let (_, mesh, _) = add_mesh_node(&mut scene, "only mesh", false);

    let stats = compositor.begin_mask_pass(&mut scene).unwrap();
    assert_eq!(stats.darkened, 1);
    assert_eq!(stats.preserved, 0);
    assert_eq!(compositor.saved_count(), 1);
    assert_eq!(
        material_of(&scene, mesh),
        compositor.dark_material().unwrap()
    );

    compositor.end_mask_pass(&mut scene).unwrap();
    assert_eq!(compositor.saved_count(), 0);
}

#[test]
fn toggling_membership_changes_next_mask() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let (node, mesh, material) = add_mesh_node(&mut scene, "toggle me", false);

    compositor.begin_mask_pass(&mut scene).unwrap();
    assert_ne!(material_of(&scene, mesh), material);
    compositor.end_mask_pass(&mut scene).unwrap();

    scene.get_node_mut(node).unwrap().layers.enable(BLOOM_LAYER);

    let stats = compositor.begin_mask_pass(&mut scene).unwrap();
    assert_eq!(stats.darkened, 0);
    assert_eq!(stats.preserved, 1);
    assert_eq!(material_of(&scene, mesh), material);
    compositor.end_mask_pass(&mut scene).unwrap();
}

#[test]
fn mask_stats_account_for_every_mesh() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    for i in 0..7 {
        add_mesh_node(&mut scene, &format!("mesh.{i}"), i < 3);
    }

    let stats = compositor.begin_mask_pass(&mut scene).unwrap();
    assert_eq!(stats.preserved, 3);
    assert_eq!(stats.darkened, 4);
    assert_eq!(stats.darkened + stats.preserved, scene.meshes.len());

    compositor.end_mask_pass(&mut scene).unwrap();
}

// ============================================================================
// Protocol misuse
// ============================================================================

#[test]
fn double_begin_errors_and_leaves_scene_unchanged() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let (_, mesh, material) = add_mesh_node(&mut scene, "plain", false);

    compositor.begin_mask_pass(&mut scene).unwrap();
    let masked = material_of(&scene, mesh);
    let saved = compositor.saved_count();

    let err = compositor.begin_mask_pass(&mut scene).unwrap_err();
    assert!(matches!(err, HaloError::MaskPassActive));

    // 第二次 begin 不能动场景，也不能动侧表
    assert_eq!(material_of(&scene, mesh), masked);
    assert_eq!(compositor.saved_count(), saved);

    compositor.end_mask_pass(&mut scene).unwrap();
    assert_eq!(material_of(&scene, mesh), material);
    assert_eq!(compositor.saved_count(), 0);
}

#[test]
fn end_without_begin_errors() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    add_mesh_node(&mut scene, "plain", false);

    let err = compositor.end_mask_pass(&mut scene).unwrap_err();
    assert!(matches!(err, HaloError::MaskPassNotActive));
    assert!(!compositor.is_mask_active());

    // 之后正常的一对调用仍然成立
    compositor.begin_mask_pass(&mut scene).unwrap();
    compositor.end_mask_pass(&mut scene).unwrap();
}

// ============================================================================
// Edge cases: shared meshes, removed meshes, removed dark material
// ============================================================================

#[test]
fn shared_mesh_component_keeps_earliest_saved_material() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let (_, mesh, material) = add_mesh_node(&mut scene, "shared", false);

    // 第二个节点挂同一个 Mesh 组件
    let mut twin = Node::new();
    twin.name = Some("twin".to_string());
    twin.mesh = Some(mesh);
    scene.add_node(twin);

    let stats = compositor.begin_mask_pass(&mut scene).unwrap();
    assert_eq!(stats.darkened, 1, "shared mesh must be recorded once");
    assert_eq!(compositor.saved_count(), 1);

    compositor.end_mask_pass(&mut scene).unwrap();
    assert_eq!(material_of(&scene, mesh), material);
}

#[test]
fn mesh_removed_while_masked_does_not_panic() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let (node, _, _) = add_mesh_node(&mut scene, "doomed", false);
    let (_, survivor_mesh, survivor_material) = add_mesh_node(&mut scene, "survivor", false);

    compositor.begin_mask_pass(&mut scene).unwrap();
    scene.remove_node(node);

    compositor.end_mask_pass(&mut scene).unwrap();
    assert_eq!(compositor.saved_count(), 0);
    assert_eq!(material_of(&scene, survivor_mesh), survivor_material);
}

#[test]
fn dark_material_is_recreated_if_removed() {
    let mut scene = Scene::new();
    let mut compositor = SelectiveBloom::new();

    let (_, mesh, material) = add_mesh_node(&mut scene, "plain", false);

    compositor.begin_mask_pass(&mut scene).unwrap();
    compositor.end_mask_pass(&mut scene).unwrap();

    let first_dark = compositor.dark_material().unwrap();
    scene.materials.remove(first_dark);

    compositor.begin_mask_pass(&mut scene).unwrap();
    let second_dark = compositor.dark_material().unwrap();
    assert!(scene.materials.contains_key(second_dark));
    assert_eq!(material_of(&scene, mesh), second_dark);

    compositor.end_mask_pass(&mut scene).unwrap();
    assert_eq!(material_of(&scene, mesh), material);
}
