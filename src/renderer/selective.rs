//! Selective Bloom Compositor
//!
//! Restricts bloom to an opt-in set of scene objects. Membership is
//! expressed through the node layer mask: a node glows when its layer
//! mask has [`BLOOM_LAYER`] enabled.
//!
//! # Protocol
//!
//! The glow source image must contain only the contributing objects, with
//! everything else black so it occludes correctly but adds no light:
//!
//! 1. [`begin_mask_pass`](SelectiveBloom::begin_mask_pass): every mesh
//!    whose node is *not* on the bloom layer has its material assignment
//!    swapped to a shared black material. Original assignments are
//!    recorded in a side table keyed by mesh identity.
//! 2. The renderer draws the scene into the bloom source target.
//! 3. [`end_mask_pass`](SelectiveBloom::end_mask_pass): the side table is
//!    drained and every recorded assignment is restored.
//! 4. The renderer draws the normal scene pass and runs the bloom chain
//!    on the source image, compositing the result additively.
//!
//! The two phases are explicit calls that return errors on misuse:
//! calling begin twice, or end without begin, is a bug in the caller and
//! is reported rather than silently tolerated. Meshes are masked
//! regardless of visibility; an invisible mesh draws nothing in either
//! pass, so darkening it is harmless and keeps the rule simple.
//!
//! The side table lives here, not on the meshes: a mesh only ever holds
//! its current material assignment, and the compositor owns the memory of
//! what was swapped out.

use slotmap::SecondaryMap;

use glam::Vec4;

use crate::errors::{HaloError, Result};
use crate::resources::material::{Material, MeshBasicMaterial};
use crate::scene::{Layers, MaterialKey, MeshKey, Node, Scene};

/// Layer channel reserved for bloom membership.
///
/// Channel 0 is the default render layer; bloom contributors additionally
/// enable this channel.
pub const BLOOM_LAYER: u32 = 1;

/// What a mask pass did, mostly useful for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskStats {
    /// Meshes swapped to the black material.
    pub darkened: usize,
    /// Meshes left untouched because their node is on the bloom layer.
    pub preserved: usize,
}

/// Owns the mask-pass state: the shared black material and the table of
/// displaced material assignments.
pub struct SelectiveBloom {
    dark_material: Option<MaterialKey>,
    saved_materials: SecondaryMap<MeshKey, MaterialKey>,
    mask_active: bool,
}

impl Default for SelectiveBloom {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectiveBloom {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dark_material: None,
            saved_materials: SecondaryMap::new(),
            mask_active: false,
        }
    }

    /// Layer mask that selects only bloom contributors.
    #[must_use]
    pub fn bloom_layers() -> Layers {
        let mut layers = Layers::empty();
        layers.enable(BLOOM_LAYER);
        layers
    }

    /// Whether this node's meshes feed the bloom source image.
    #[must_use]
    pub fn node_contributes(node: &Node) -> bool {
        node.layers.is_enabled(BLOOM_LAYER)
    }

    /// True between a successful `begin_mask_pass` and `end_mask_pass`.
    #[inline]
    #[must_use]
    pub fn is_mask_active(&self) -> bool {
        self.mask_active
    }

    /// Swaps every non-contributing mesh to the shared black material.
    ///
    /// Records each displaced assignment keyed by mesh identity. Meshes on
    /// nodes with the bloom layer enabled keep their materials. Nodes
    /// without a mesh component are never touched.
    ///
    /// # Errors
    ///
    /// [`HaloError::MaskPassActive`] when a previous mask pass was not
    /// closed with [`end_mask_pass`](Self::end_mask_pass). The scene is
    /// left unchanged in that case.
    pub fn begin_mask_pass(&mut self, scene: &mut Scene) -> Result<MaskStats> {
        if self.mask_active {
            return Err(HaloError::MaskPassActive);
        }

        let dark = self.ensure_dark_material(scene);
        let mut stats = MaskStats::default();

        for (_, node) in &scene.nodes {
            let Some(mesh_key) = node.mesh else {
                continue;
            };

            if Self::node_contributes(node) {
                stats.preserved += 1;
                continue;
            }

            let Some(mesh) = scene.meshes.get_mut(mesh_key) else {
                // 节点指向了已经被移除的 Mesh，跳过
                continue;
            };

            if self.saved_materials.contains_key(mesh_key) {
                // 两个节点共享同一个 Mesh 组件。第一次记录的才是真正的
                // 原始材质，后到的直接忽略。
                log::warn!(
                    "mesh {:?} masked twice in one pass, keeping first saved material",
                    mesh.name
                );
                continue;
            }

            self.saved_materials.insert(mesh_key, mesh.material);
            mesh.material = dark;
            stats.darkened += 1;
        }

        self.mask_active = true;
        Ok(stats)
    }

    /// Restores every assignment recorded by the matching
    /// [`begin_mask_pass`](Self::begin_mask_pass) and empties the table.
    ///
    /// A mesh that was removed from the scene while masked is skipped with
    /// a warning; the remaining entries are still restored.
    ///
    /// # Errors
    ///
    /// [`HaloError::MaskPassNotActive`] when no mask pass is open.
    pub fn end_mask_pass(&mut self, scene: &mut Scene) -> Result<()> {
        if !self.mask_active {
            return Err(HaloError::MaskPassNotActive);
        }

        for (mesh_key, original) in self.saved_materials.drain() {
            if let Some(mesh) = scene.meshes.get_mut(mesh_key) {
                mesh.material = original;
            } else {
                log::warn!("mesh removed while masked, dropping its saved material");
            }
        }

        self.mask_active = false;
        Ok(())
    }

    /// Number of assignments currently parked in the side table.
    #[must_use]
    pub fn saved_count(&self) -> usize {
        self.saved_materials.len()
    }

    /// Key of the shared black material, once created.
    #[must_use]
    pub fn dark_material(&self) -> Option<MaterialKey> {
        self.dark_material
    }

    fn ensure_dark_material(&mut self, scene: &mut Scene) -> MaterialKey {
        // 黑色材质可能被用户从场景里移除，按需重建
        if let Some(key) = self.dark_material
            && scene.materials.contains_key(key)
        {
            return key;
        }

        let dark = Material::from(MeshBasicMaterial::new(Vec4::new(0.0, 0.0, 0.0, 1.0)))
            .with_name("BloomMask Black");
        let key = scene.insert_material(dark);
        self.dark_material = Some(key);
        key
    }
}
