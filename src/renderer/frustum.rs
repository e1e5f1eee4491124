//! View-frustum extraction and sphere culling.

use glam::{Mat4, Vec3, Vec4};

/// Six clip planes extracted from a view-projection matrix.
///
/// 平面顺序: left, right, bottom, top, near, far。
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Gribb-Hartmann plane extraction. The near plane uses row 3 alone
    /// because wgpu clips Z to the [0, 1] range.
    #[must_use]
    pub fn from_view_projection(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [
            rows[3] + rows[0], // left
            rows[3] - rows[0], // right
            rows[3] + rows[1], // bottom
            rows[3] - rows[1], // top
            rows[2],           // near
            rows[3] - rows[2], // far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > f32::EPSILON {
                *plane /= length;
            }
        }

        Self { planes }
    }

    /// True when the sphere touches or lies inside all six planes.
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            let dist = plane.truncate().dot(center) + plane.w;
            if dist < -radius {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn look_down_neg_z() -> Mat4 {
        let proj = Mat4::perspective_rh(45f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        proj * view
    }

    #[test]
    fn sphere_in_front_of_camera_is_kept() {
        let frustum = Frustum::from_view_projection(look_down_neg_z());
        assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0));
    }

    #[test]
    fn sphere_behind_camera_is_culled() {
        let frustum = Frustum::from_view_projection(look_down_neg_z());
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, 20.0), 1.0));
    }

    #[test]
    fn large_sphere_straddling_a_plane_is_kept() {
        let frustum = Frustum::from_view_projection(look_down_neg_z());
        // Center far off to the side, but the radius reaches into view.
        assert!(frustum.intersects_sphere(Vec3::new(-30.0, 0.0, -10.0), 50.0));
    }
}
