//! Depth of Field Configuration
//!
//! Bokeh-style depth of field as pure data, same pattern as
//! [`BloomSettings`](super::bloom::BloomSettings). The pass reads the
//! depth buffer, derives a circle of confusion per pixel from the focus
//! distance and aperture, and gathers blurred samples up to `max_blur`.

use crate::define_gpu_data_struct;
use crate::resources::buffer::CpuBuffer;

define_gpu_data_struct!(
    /// GPU uniform data for the depth of field pass.
    ///
    /// `focus_distance` is in world units along the view ray. `aperture`
    /// scales how fast blur grows away from the focus plane. `max_blur`
    /// caps the blur circle in UV units.
    pub struct DofUniforms {
        pub focus_distance: f32 = 1.0,
        pub aperture: f32 = 0.025,
        pub max_blur: f32 = 1.0,
        pub __pad: u32,
    }
);

/// Depth of field configuration (pure data + automatic version control).
///
/// # Usage
///
/// ```rust,ignore
/// let dof = &mut scene.dof;
/// dof.set_enabled(true);
/// dof.set_focus_distance(9.0);
/// dof.set_aperture(0.025);
/// ```
#[derive(Debug, Clone)]
pub struct DofSettings {
    /// Whether depth of field is enabled.
    pub enabled: bool,

    /// Focus/aperture/blur uniforms. Updated via the setter methods.
    pub(crate) uniforms: CpuBuffer<DofUniforms>,
}

impl Default for DofSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            uniforms: CpuBuffer::new(
                DofUniforms::default(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                Some("DofUniforms"),
            ),
        }
    }
}

impl DofSettings {
    /// Creates new depth of field settings with default values (disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current focus distance in world units.
    #[inline]
    #[must_use]
    pub fn focus_distance(&self) -> f32 {
        self.uniforms.read().focus_distance
    }

    /// Returns the current aperture.
    #[inline]
    #[must_use]
    pub fn aperture(&self) -> f32 {
        self.uniforms.read().aperture
    }

    /// Returns the current maximum blur radius.
    #[inline]
    #[must_use]
    pub fn max_blur(&self) -> f32 {
        self.uniforms.read().max_blur
    }

    /// Sets whether depth of field is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the focus distance in world units.
    pub fn set_focus_distance(&mut self, distance: f32) {
        self.uniforms.write().focus_distance = distance.max(0.0);
    }

    /// Sets the aperture. Larger values blur out-of-focus areas faster.
    pub fn set_aperture(&mut self, aperture: f32) {
        self.uniforms.write().aperture = aperture.max(0.0);
    }

    /// Sets the maximum blur circle radius in UV units.
    pub fn set_max_blur(&mut self, max_blur: f32) {
        self.uniforms.write().max_blur = max_blur.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let dof = DofSettings::new();
        assert!(!dof.enabled);
        assert_eq!(dof.focus_distance(), 1.0);
        assert_eq!(dof.aperture(), 0.025);
        assert_eq!(dof.max_blur(), 1.0);
    }

    #[test]
    fn focus_distance_stays_non_negative() {
        let mut dof = DofSettings::new();
        dof.set_focus_distance(-5.0);
        assert_eq!(dof.focus_distance(), 0.0);
    }
}
