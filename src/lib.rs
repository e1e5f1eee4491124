#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;

#[cfg(feature = "gltf")]
pub mod assets;

#[cfg(feature = "winit")]
pub mod app;

#[cfg(feature = "egui")]
pub mod gui;

pub use errors::{HaloError, Result};
pub use renderer::{
    MaskStats, OverlayPass, Renderer, RendererSettings, SelectiveBloom, BLOOM_LAYER,
};
pub use resources::primitives::*;
pub use resources::{
    Attribute, BloomSettings, DofSettings, Geometry, Material, MeshBasicMaterial,
    MeshStandardMaterial, Texture, ToneMappingMode, ToneMappingSettings,
};
pub use resources::Mesh;
pub use scene::{Camera, Layers, Light, Node, NodeIndex, Scene};
pub use utils::FpsCounter;

#[cfg(feature = "winit")]
pub use utils::orbit_control::OrbitControls;

#[cfg(feature = "gltf")]
pub use assets::load_gltf;

#[cfg(feature = "winit")]
pub use app::{App, AppContext, AppHandler, FrameState};

#[cfg(feature = "egui")]
pub use gui::GuiLayer;
