//! 环绕相机控制器
//!
//! 球坐标 (theta, phi, radius) 围绕 `center` 旋转：左键拖拽旋转（带阻尼
//! 惯性），滚轮指数缩放，右键拖拽平移焦点。每帧把结果写回相机节点的
//! [`Transform`]。

use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::app::input::Input;
use crate::scene::transform::Transform;

pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
}

impl OrbitControls {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 1.0,
            max_distance: 1000.0,

            center,
            radius,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Processes this frame's input and writes the orbit pose into the
    /// camera node's transform.
    pub fn update(&mut self, transform: &mut Transform, input: &Input, fov_degrees: f32, dt: f32) {
        let screen_height = input.screen_size.y.max(1.0);

        if input.is_button_pressed(MouseButton::Left) {
            // 整屏高度的拖拽对应一整圈
            let per_pixel = 2.0 * std::f32::consts::PI / screen_height;
            self.rotate_delta -= input.cursor_delta * per_pixel * self.rotate_speed;
        }

        self.apply_rotation(dt);
        self.apply_zoom(input.scroll_delta.y);
        if input.is_button_pressed(MouseButton::Right) {
            self.apply_pan(input.cursor_delta, fov_degrees, screen_height);
        }

        transform.position = self.center + self.offset() * self.radius;
        transform.look_at(self.center, Vec3::Y);
    }

    fn apply_rotation(&mut self, dt: f32) {
        if self.enable_damping {
            // 帧率无关的指数衰减，以 60fps 为基准
            let retention = (1.0 - self.damping_factor).powf(dt * 60.0);
            let applied = self.rotate_delta * (1.0 - retention);
            self.theta += applied.x;
            self.phi += applied.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        const EPS: f32 = 1e-4;
        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);
    }

    fn apply_zoom(&mut self, scroll: f32) {
        if scroll == 0.0 {
            return;
        }
        let scale = (1.0 - self.zoom_speed).powf(scroll.abs());
        if scroll > 0.0 {
            self.radius *= scale;
        } else {
            self.radius /= scale;
        }
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
    }

    fn apply_pan(&mut self, cursor_delta: Vec2, fov_degrees: f32, screen_height: f32) {
        // 一像素对应焦平面上多少世界单位
        let half_fov = fov_degrees.to_radians() / 2.0;
        let world_height = 2.0 * self.radius * half_fov.tan();
        let per_pixel = world_height / screen_height;

        let forward = -self.offset();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();

        self.center +=
            (right * -cursor_delta.x + up * cursor_delta.y) * per_pixel * self.pan_speed;
    }

    /// Unit vector from the center toward the camera.
    fn offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }
}
