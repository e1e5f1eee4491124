//! Tone Mapping Configuration
//!
//! Tone mapping modes and settings as pure data. Placed in the resources
//! layer so both Scene and Renderer can depend on them without a cycle.
//!
//! The tonemap pass branches on a mode index uploaded with the uniforms,
//! so switching modes never rebuilds a pipeline.

use crate::define_gpu_data_struct;
use crate::resources::buffer::{BufferReadGuard, CpuBuffer};

/// Tone mapping algorithm selection.
///
/// - [`Linear`](ToneMappingMode::Linear): No tone mapping (debugging or LDR workflows)
/// - [`Reinhard`](ToneMappingMode::Reinhard): Classic operator, soft highlight rolloff
/// - [`Neutral`](ToneMappingMode::Neutral): Balanced, film-like response
/// - [`ACESFilmic`](ToneMappingMode::ACESFilmic): Industry standard filmic curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToneMappingMode {
    /// No tone mapping (linear passthrough)
    Linear,
    /// Reinhard operator (classic, soft highlights)
    Reinhard,
    /// Neutral tone mapping (balanced, film-like)
    Neutral,
    /// ACES Filmic (industry standard)
    #[default]
    ACESFilmic,
}

impl ToneMappingMode {
    /// Index understood by the tonemap shader.
    #[must_use]
    pub fn shader_index(self) -> u32 {
        match self {
            Self::Linear => 0,
            Self::Reinhard => 1,
            Self::Neutral => 2,
            Self::ACESFilmic => 3,
        }
    }

    /// Returns a human-readable name for the mode.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Reinhard => "Reinhard",
            Self::Neutral => "Neutral",
            Self::ACESFilmic => "ACES Filmic",
        }
    }

    /// Returns all available tone mapping modes.
    #[must_use]
    pub fn all() -> &'static [ToneMappingMode] {
        &[
            Self::Linear,
            Self::Reinhard,
            Self::Neutral,
            Self::ACESFilmic,
        ]
    }
}

define_gpu_data_struct!(
    pub struct ToneMappingUniforms {
        pub exposure: f32 = 1.0,
        pub mode: u32 = 3,
        pub __pad: [u32; 2],
    }
);

/// Tone mapping configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let settings = &mut scene.tone_mapping;
/// settings.set_mode(ToneMappingMode::ACESFilmic);
/// settings.set_exposure(1.5);
/// ```
#[derive(Debug, Clone)]
pub struct ToneMappingSettings {
    /// Selected tone mapping algorithm
    mode: ToneMappingMode,

    pub(crate) uniforms: CpuBuffer<ToneMappingUniforms>,
}

impl Default for ToneMappingSettings {
    fn default() -> Self {
        Self {
            mode: ToneMappingMode::default(),
            uniforms: CpuBuffer::new(
                ToneMappingUniforms::default(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("ToneMappingUniforms"),
            ),
        }
    }
}

impl ToneMappingSettings {
    /// Creates new tone mapping settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniforms(&self) -> BufferReadGuard<'_, ToneMappingUniforms> {
        self.uniforms.read()
    }

    /// Sets the tone mapping mode.
    pub fn set_mode(&mut self, mode: ToneMappingMode) {
        if self.mode != mode {
            self.mode = mode;
            self.uniforms.write().mode = mode.shader_index();
        }
    }

    /// Sets the exposure multiplier applied before the tone curve.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.uniforms.write().exposure = exposure.max(0.0);
    }

    /// Returns the current tone mapping mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> ToneMappingMode {
        self.mode
    }

    /// Returns the current exposure value.
    #[inline]
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.uniforms.read().exposure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_aces_filmic() {
        // ACES Filmic 是默认曲线，uniform 里的索引必须一致
        let settings = ToneMappingSettings::new();
        assert_eq!(settings.mode(), ToneMappingMode::ACESFilmic);
        assert_eq!(
            settings.uniforms().mode,
            ToneMappingMode::ACESFilmic.shader_index()
        );
    }

    #[test]
    fn mode_change_updates_shader_index() {
        let mut settings = ToneMappingSettings::new();

        settings.set_mode(ToneMappingMode::Reinhard);
        assert_eq!(settings.uniforms().mode, 1);

        settings.set_mode(ToneMappingMode::Linear);
        assert_eq!(settings.uniforms().mode, 0);
    }

    #[test]
    fn exposure_rejects_negative_values() {
        let mut settings = ToneMappingSettings::new();
        settings.set_exposure(-2.0);
        assert_eq!(settings.exposure(), 0.0);
    }
}
