use glam::{Affine3A, Mat4, Vec3};
use std::borrow::Cow;
use uuid::Uuid;

/// Perspective camera component.
///
/// Projection parameters are plain public fields; call
/// [`update_projection_matrix`](Self::update_projection_matrix) after
/// changing them. The view side is derived from the owning node's world
/// matrix during the scene update.
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,
    pub name: Cow<'static, str>,

    // === Projection ===
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // 缓存的矩阵，渲染器只读
    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// Creates a perspective camera. `fov` is in degrees, matching the
    /// convention of the demo scripts; it is stored in radians.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            uuid: Uuid::new_v4(),
            name: Cow::Borrowed("Camera"),
            fov: fov.to_radians(),
            aspect,
            near,
            far,

            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };

        cam.update_projection_matrix();
        cam
    }

    /// Updates the aspect ratio and rebuilds the projection matrix.
    ///
    /// Called by the app shell whenever the window is resized.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    /// Rebuilds the projection matrix from the current fov/aspect/near/far.
    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh targets the WGPU/Vulkan depth range (0 to 1)
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Refreshes the view matrices from the owning node's world transform.
    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;

        // View = world inverse
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// World-space camera position (valid after the scene update).
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_aspect_rebuilds_projection() {
        let mut cam = Camera::new_perspective(45.0, 800.0 / 600.0, 0.1, 1000.0);
        let before = cam.projection_matrix();

        cam.set_aspect(1920.0 / 1080.0);
        let after = cam.projection_matrix();

        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_ne!(before, after, "projection must change with the aspect ratio");
    }

    #[test]
    fn test_view_follows_world_transform() {
        let mut cam = Camera::new_perspective(45.0, 1.0, 0.1, 100.0);
        let world = Affine3A::from_translation(Vec3::new(0.0, 0.0, 9.0));
        cam.update_view_projection(&world);

        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 9.0));
        // A point at the origin sits 9 units down the view -Z axis.
        let p = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!((p.z + 9.0).abs() < 1e-5);
    }
}
