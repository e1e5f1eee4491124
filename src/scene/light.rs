use glam::Vec3;
use uuid::Uuid;

/// Point light parameters.
#[derive(Debug, Clone)]
pub struct PointLight {
    /// Influence radius used for distance attenuation. `0.0` disables the
    /// range cutoff.
    pub range: f32,
}

/// Light component in the scene.
///
/// Ambient lights ignore their node transform; point lights illuminate from
/// their node's world position.
#[derive(Debug, Clone)]
pub enum LightKind {
    Ambient,
    Point(PointLight),
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Point(PointLight { range }),
        }
    }
}
