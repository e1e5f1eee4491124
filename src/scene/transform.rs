use glam::{Affine3A, EulerRot, Mat3, Mat4, Quat, Vec3};

/// TRS transform component with cached matrices and dirty tracking.
///
/// The `position` / `rotation` / `scale` fields are plain public data; the
/// component compares them against a private shadow copy to decide when the
/// local matrix actually needs to be rebuilt.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    // 矩阵缓存，渲染器通过 world_matrix() 读取
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    // 影子状态，用于脏检查
    prev_position: Vec3,
    prev_rotation: Quat,
    prev_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            prev_position: Vec3::ZERO,
            prev_rotation: Quat::IDENTITY,
            prev_scale: Vec3::ONE,
            force_update: true,
        }
    }

    /// Rebuilds the local matrix when any TRS field changed since the last
    /// call. Returns whether a rebuild happened, so the scene can decide
    /// whether child world matrices need refreshing.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.prev_position
            || self.rotation != self.prev_rotation
            || self.scale != self.prev_scale
            || self.force_update;

        if changed {
            self.local_matrix = Affine3A::from_scale_rotation_translation(
                self.scale,
                self.rotation,
                self.position,
            );

            self.prev_position = self.position;
            self.prev_rotation = self.rotation;
            self.prev_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// Sets the rotation from XYZ Euler angles (radians).
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// World matrix for CPU-side math (distances, attachment points).
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// World matrix as `Mat4`, the form uploaded to the GPU.
    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    /// Written by the scene after hierarchy propagation.
    pub(crate) fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Overwrites the local matrix directly (model import, controller sync).
    ///
    /// The matrix is decomposed back into TRS fields; shear is lost.
    pub fn apply_local_matrix(&mut self, mat: Affine3A) {
        self.local_matrix = mat;

        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = translation;

        self.prev_scale = scale;
        self.prev_rotation = rotation;
        self.prev_position = translation;

        self.mark_dirty();
    }

    /// `Mat4` convenience wrapper around [`apply_local_matrix`](Self::apply_local_matrix).
    pub fn apply_local_matrix_from_mat4(&mut self, mat: Mat4) {
        self.apply_local_matrix(Affine3A::from_mat4(mat));
    }

    /// Rotates the transform so -Z points at `target`.
    ///
    /// `target` and `up` are expressed in the parent coordinate system.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();

        // 退化情况：视线与 up 平行
        if forward.cross(up).length_squared() < 1e-4 {
            return;
        }

        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();

        let rot_mat = Mat3::from_cols(right, new_up, -forward);
        self.rotation = Quat::from_mat3(&rot_mat);
    }

    /// Forces a matrix rebuild on the next update.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
