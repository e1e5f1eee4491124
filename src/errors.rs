//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`HaloError`] covers all failure modes including:
//! - GPU initialization and surface failures
//! - Asset loading and decoding errors
//! - Bloom compositor protocol misuse
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, HaloError>`.
//!
//! ```rust,ignore
//! use halo::errors::{HaloError, Result};
//!
//! fn load_asset() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Halo engine.
///
/// This enum covers all possible error conditions that can occur
/// during engine operation. Each variant provides specific context
/// about what went wrong.
#[derive(Error, Debug)]
pub enum HaloError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(#[from] wgpu::RequestAdapterError),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create the rendering surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// Failed to acquire the next swapchain frame.
    #[error("Surface error: {0:?}")]
    SurfaceError(wgpu::CurrentSurfaceTexture),

    /// The adapter does not support rendering to the window surface.
    #[error("Surface not supported by adapter")]
    SurfaceConfigUnsupported,

    /// Window system error.
    #[error("Window system error: {0}")]
    WindowError(#[from] raw_window_handle::HandleError),

    /// Event loop error (winit).
    #[cfg(feature = "winit")]
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Bloom Compositor Protocol Errors
    // ========================================================================
    /// `begin_mask_pass` was called while a mask pass was already active.
    #[error("Bloom mask pass already active: end_mask_pass() was not called for the previous pass")]
    MaskPassActive,

    /// `end_mask_pass` was called without a matching `begin_mask_pass`.
    #[error("No bloom mask pass active: begin_mask_pass() was not called this frame")]
    MaskPassNotActive,

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    /// A glTF primitive is missing an attribute the renderer requires.
    #[cfg(feature = "gltf")]
    #[error("glTF primitive missing attribute: {0}")]
    GltfMissingAttribute(&'static str),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for HaloError {
    fn from(err: image::ImageError) -> Self {
        HaloError::ImageDecodeError(err.to_string())
    }
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for HaloError {
    fn from(err: gltf::Error) -> Self {
        HaloError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, HaloError>`.
pub type Result<T> = std::result::Result<T, HaloError>;
