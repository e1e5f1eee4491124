//! Asset Loading Tests
//!
//! Failure paths of the glTF importer: the scene must stay untouched when
//! the file is missing or unparseable.

#![cfg(feature = "gltf")]

use std::io::Write;

use halo::scene::Scene;
use halo::{HaloError, load_gltf};

fn counts(scene: &Scene) -> (usize, usize, usize, usize) {
    (
        scene.nodes.len(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.geometries.len(),
    )
}

#[test]
fn missing_file_leaves_scene_untouched() {
    let mut scene = Scene::new();
    let before = counts(&scene);

    let err = load_gltf(&mut scene, "does/not/exist.glb").unwrap_err();
    assert!(matches!(err, HaloError::AssetNotFound(_)));
    assert_eq!(counts(&scene), before);
}

#[test]
fn corrupt_bytes_leave_scene_untouched() {
    let path = std::env::temp_dir().join("halo_corrupt_model.glb");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"this is definitely not a glb container").unwrap();
    }

    let mut scene = Scene::new();
    let before = counts(&scene);

    let err = load_gltf(&mut scene, &path).unwrap_err();
    assert!(matches!(err, HaloError::GltfError(_)));
    assert_eq!(counts(&scene), before);

    let _ = std::fs::remove_file(&path);
}
