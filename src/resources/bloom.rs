//! Bloom Post-Processing Configuration
//!
//! Bloom settings as pure data, following the same pattern as
//! [`ToneMappingSettings`](super::tone_mapping::ToneMappingSettings).
//!
//! The pipeline is a thresholded prefilter with a soft knee, a progressive
//! downsample chain, tent-filter upsampling, and an additive composite
//! scaled by `strength`. Glow width comes from the mip chain; `radius`
//! scales the tent filter during upsampling.
//!
//! # GPU Uniform Structs
//!
//! - [`PrefilterUniforms`]: Threshold and knee for the bright-pass.
//! - [`UpsampleUniforms`]: Tent filter radius during upsampling.
//! - [`CompositeUniforms`]: Bloom strength during final composition.
//!
//! These are defined here (rather than in the render pass) so that
//! `BloomSettings` can own the `CpuBuffer<T>` instances. Setters write
//! through `CpuBuffer::write()`, so version tracking is automatic and the
//! render pass uploads only when something actually changed.

use crate::define_gpu_data_struct;
use crate::resources::buffer::CpuBuffer;

// ============================================================================
// GPU Uniform Structs
// ============================================================================

define_gpu_data_struct!(
    /// GPU uniform data for the bright-pass prefilter.
    ///
    /// `knee` softens the cutoff around `threshold`; with a threshold of
    /// zero the whole image feeds the bloom chain.
    pub struct PrefilterUniforms {
        pub threshold: f32 = 0.0,
        pub knee: f32 = 0.1,
        pub __pad: [u32; 2],
    }
);

define_gpu_data_struct!(
    /// GPU uniform data for the upsample shader.
    pub struct UpsampleUniforms {
        pub filter_radius: f32 = 0.5,
        pub __pad: [u32; 3],
    }
);

define_gpu_data_struct!(
    /// GPU uniform data for the composite shader.
    pub struct CompositeUniforms {
        pub bloom_strength: f32 = 1.0,
        pub __pad: [u32; 3],
    }
);

// ============================================================================
// BloomSettings
// ============================================================================

/// Bloom configuration (pure data + automatic version control).
///
/// # Usage
///
/// ```rust,ignore
/// let bloom = &mut scene.bloom;
/// bloom.set_enabled(true);
/// bloom.set_threshold(0.0);
/// bloom.set_strength(1.0);
/// bloom.set_radius(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct BloomSettings {
    /// Whether bloom is enabled.
    pub enabled: bool,

    /// Maximum number of mip levels in the downsample/upsample chain.
    ///
    /// More levels widen the glow at the cost of extra passes. The actual
    /// count is clamped to what the render target size allows.
    ///
    /// Default: `5`
    max_mip_levels: u32,

    /// Whether to apply Karis average on the first downsample pass.
    ///
    /// Weights samples by inverse luminance, which suppresses firefly
    /// artifacts from extremely bright pixels.
    ///
    /// Default: `true`
    pub karis_average: bool,

    /// Bright-pass uniforms (`threshold`, `knee`).
    /// Updated via `set_threshold()` / `set_knee()`.
    pub(crate) prefilter_uniforms: CpuBuffer<PrefilterUniforms>,

    /// Upsample filter uniforms (`filter_radius`).
    /// Updated via `set_radius()`.
    pub(crate) upsample_uniforms: CpuBuffer<UpsampleUniforms>,

    /// Composite blend uniforms (`bloom_strength`).
    /// Updated via `set_strength()`.
    pub(crate) composite_uniforms: CpuBuffer<CompositeUniforms>,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_mip_levels: 5,
            karis_average: true,
            prefilter_uniforms: CpuBuffer::new(
                PrefilterUniforms::default(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("Bloom Prefilter Uniforms"),
            ),
            upsample_uniforms: CpuBuffer::new(
                UpsampleUniforms::default(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("Bloom Upsample Uniforms"),
            ),
            composite_uniforms: CpuBuffer::new(
                CompositeUniforms::default(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("Bloom Composite Uniforms"),
            ),
        }
    }
}

impl BloomSettings {
    /// Creates new bloom settings with default values (disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current brightness threshold.
    #[inline]
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.prefilter_uniforms.read().threshold
    }

    /// Returns the current bloom strength.
    #[inline]
    #[must_use]
    pub fn strength(&self) -> f32 {
        self.composite_uniforms.read().bloom_strength
    }

    /// Returns the current upsample filter radius.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.upsample_uniforms.read().filter_radius
    }

    /// Returns the maximum number of mip levels.
    #[inline]
    #[must_use]
    pub fn max_mip_levels(&self) -> u32 {
        self.max_mip_levels
    }

    /// Sets whether bloom is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the brightness threshold for the prefilter.
    ///
    /// Pixels below the threshold do not feed the glow. A threshold of
    /// 0.0 blooms everything that reaches the bloom-source image.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.prefilter_uniforms.write().threshold = threshold.max(0.0);
    }

    /// Sets the knee of the threshold curve.
    ///
    /// Larger values soften the transition around the threshold.
    pub fn set_knee(&mut self, knee: f32) {
        self.prefilter_uniforms.write().knee = knee.max(1e-4);
    }

    /// Sets the bloom strength.
    ///
    /// Scales the glow before it is added onto the scene color.
    pub fn set_strength(&mut self, strength: f32) {
        self.composite_uniforms.write().bloom_strength = strength.max(0.0);
    }

    /// Sets the maximum number of mip levels.
    pub fn set_max_mip_levels(&mut self, levels: u32) {
        self.max_mip_levels = levels.clamp(1, 16);
    }

    /// Sets the upsampling filter radius.
    ///
    /// Larger values produce softer, wider bloom.
    pub fn set_radius(&mut self, radius: f32) {
        self.upsample_uniforms.write().filter_radius = radius.max(0.0);
    }

    /// Sets whether Karis average is used on the first downsample.
    pub fn set_karis_average(&mut self, enabled: bool) {
        self.karis_average = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let bloom = BloomSettings::new();
        assert!(!bloom.enabled);
        assert_eq!(bloom.threshold(), 0.0);
        assert_eq!(bloom.strength(), 1.0);
        assert_eq!(bloom.radius(), 0.5);
        assert_eq!(bloom.max_mip_levels(), 5);
    }

    #[test]
    fn setters_clamp_to_valid_ranges() {
        let mut bloom = BloomSettings::new();

        bloom.set_strength(-1.0);
        assert_eq!(bloom.strength(), 0.0);

        bloom.set_threshold(-0.5);
        assert_eq!(bloom.threshold(), 0.0);

        bloom.set_max_mip_levels(0);
        assert_eq!(bloom.max_mip_levels(), 1);
        bloom.set_max_mip_levels(99);
        assert_eq!(bloom.max_mip_levels(), 16);
    }

    #[test]
    fn setters_bump_uniform_versions() {
        let mut bloom = BloomSettings::new();
        let v = bloom.composite_uniforms.version();
        bloom.set_strength(2.0);
        assert_eq!(bloom.composite_uniforms.version(), v + 1);
    }
}
