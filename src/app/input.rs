//! 输入状态采集
//!
//! 每帧从 winit 事件累积鼠标/键盘状态，帧末清理增量。

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Default, Debug, Clone)]
pub struct Input {
    /// 当前鼠标在窗口内的位置
    pub cursor_position: Vec2,
    /// 上一帧到这一帧的鼠标位移 (dx, dy)
    pub cursor_delta: Vec2,
    /// 这一帧的滚轮滚动量 (x, y)
    pub scroll_delta: Vec2,
    /// 窗口大小
    pub screen_size: Vec2,
    /// 当前按下的鼠标按键集合
    pub mouse_buttons: HashSet<MouseButton>,

    /// 当前按住的物理按键
    pub keys_pressed: HashSet<KeyCode>,
    /// 这一帧刚按下的物理按键
    pub keys_just_pressed: HashSet<KeyCode>,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 帧末清理（清除 delta 状态，防止一直旋转）
    pub fn end_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
        self.keys_just_pressed.clear();
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.screen_size = Vec2::new(width as f32, height as f32);
    }

    pub fn handle_cursor_move(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        // 如果是第一帧，delta 设为 0，否则计算差值
        if self.cursor_position != Vec2::ZERO {
            self.cursor_delta += new_pos - self.cursor_position;
        }
        self.cursor_position = new_pos;
    }

    pub fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons.remove(&button);
            }
        }
    }

    pub fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(x, y) => {
                self.scroll_delta += Vec2::new(x, y);
            }
            MouseScrollDelta::PixelDelta(pos) => {
                // 简单的缩放转换，通常 PixelDelta 值较大
                self.scroll_delta += Vec2::new(pos.x as f32, pos.y as f32) * 0.1;
            }
        }
    }

    pub fn handle_keyboard_input(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match event.state {
            ElementState::Pressed => {
                if self.keys_pressed.insert(code) {
                    self.keys_just_pressed.insert(code);
                }
            }
            ElementState::Released => {
                self.keys_pressed.remove(&code);
            }
        }
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    #[must_use]
    pub fn is_key_pressed(&self, code: KeyCode) -> bool {
        self.keys_pressed.contains(&code)
    }

    /// True only on the frame the key went down; key repeat is ignored.
    #[must_use]
    pub fn was_key_just_pressed(&self, code: KeyCode) -> bool {
        self.keys_just_pressed.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_frame_clears_deltas() {
        let mut input = Input::new();
        input.cursor_delta = Vec2::new(3.0, 4.0);
        input.scroll_delta = Vec2::new(0.0, 1.0);
        input.keys_just_pressed.insert(KeyCode::KeyF);
        input.keys_pressed.insert(KeyCode::KeyF);

        input.end_frame();

        assert_eq!(input.cursor_delta, Vec2::ZERO);
        assert_eq!(input.scroll_delta, Vec2::ZERO);
        assert!(!input.was_key_just_pressed(KeyCode::KeyF));
        // 按住状态跨帧保留
        assert!(input.is_key_pressed(KeyCode::KeyF));
    }

    #[test]
    fn first_cursor_move_produces_no_delta() {
        let mut input = Input::new();
        input.handle_cursor_move(100.0, 50.0);
        assert_eq!(input.cursor_delta, Vec2::ZERO);

        input.handle_cursor_move(110.0, 45.0);
        assert_eq!(input.cursor_delta, Vec2::new(10.0, -5.0));
    }
}
