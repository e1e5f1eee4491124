//! 渲染通道
//!
//! 固定的帧结构按以下顺序执行：
//! forward (×2，带遮罩时) → bloom → depth of field → tone mapping。
//! 每个通道自己持有管线与 bind group 缓存，按渲染目标代数失效。

pub mod bloom;
pub mod dof;
pub mod forward;
pub mod tone_mapping;

pub use bloom::BloomPass;
pub use dof::DofPass;
pub use forward::ForwardPass;
pub use tone_mapping::ToneMappingPass;

/// Identifies which intermediate color target a post pass reads.
///
/// Cached bind groups must be rebuilt when a pass's input moves to a
/// different slot (e.g. DOF reads `SceneColor` while bloom is disabled and
/// `PostA` while it is enabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSlot {
    SceneColor,
    PostA,
    PostB,
}
