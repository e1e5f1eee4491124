use crate::scene::layers::Layers;
use crate::scene::transform::Transform;
use crate::scene::{CameraKey, LightKey, MeshKey, NodeIndex};
use glam::Affine3A;
use smallvec::SmallVec;

/// A scene node: hierarchy, transform, and per-object render state.
///
/// # Design Principles
///
/// - Keeps only data that must be touched every frame (hierarchy, transform,
///   visibility, layer mask) plus slim component keys
/// - Heavier components (Mesh, Camera, Light) live in the scene's component
///   maps; the node stores only their keys
/// - Small nodes keep the arena traversal cache-friendly
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child links:
/// - `parent`: optional index of the parent node (`None` for roots)
/// - `children`: list of child node indices
///
/// # Layers
///
/// The [`Layers`] mask expresses group membership, e.g. whether the node's
/// mesh feeds the bloom pass. Cameras and effects test their own mask
/// against it.
#[derive(Debug, Clone)]
pub struct Node {
    // === Core Hierarchy ===
    /// Parent node index (None for root nodes)
    pub(crate) parent: Option<NodeIndex>,
    /// Child node indices
    pub(crate) children: SmallVec<[NodeIndex; 4]>,

    // === Core Spatial Data ===
    /// Transform component (hot data accessed every frame)
    pub transform: Transform,

    // === Core State ===
    /// Visibility flag; invisible nodes are skipped by the renderer
    pub visible: bool,
    /// Group membership mask
    pub layers: Layers,
    /// Optional debug / lookup name (model sub-parts are found by this)
    pub name: Option<String>,

    // === Components ===
    /// Attached mesh component, if any
    pub mesh: Option<MeshKey>,
    /// Attached camera component, if any
    pub camera: Option<CameraKey>,
    /// Attached light component, if any
    pub light: Option<LightKey>,
}

impl Node {
    /// Creates a new node with default transform, visible, on layer 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            transform: Transform::new(),
            visible: true,
            layers: Layers::new(),
            name: None,
            mesh: None,
            camera: None,
            light: None,
        }
    }

    /// Returns the parent node index, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Returns a read-only slice of child node indices.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// Valid after the scene's hierarchy update for the current frame.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
