/// Per-frame input snapshot filled by the window loop
use glam::{Vec2, Vec3};
use std::collections::HashSet;
use winit::keyboard::KeyCode;

#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    /// Accumulated raw pointer motion since the last frame
    mouse_delta: Vec2,
    /// Cursor position in window pixels
    pub mouse_position: Vec2,
    /// Pointer released to the on-screen controls; look input is ignored
    ui_focus: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        self.pressed_keys.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn add_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.mouse_delta += Vec2::new(dx as f32, dy as f32);
    }

    /// Pointer motion since the last call
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }

    pub fn ui_focus(&self) -> bool {
        self.ui_focus
    }

    /// Flip pointer capture; returns the new UI focus state
    pub fn toggle_ui_focus(&mut self) -> bool {
        self.ui_focus = !self.ui_focus;
        self.mouse_delta = Vec2::ZERO;
        self.ui_focus
    }

    /// Held movement keys as (forward, right, up), each in [-1, 1]
    pub fn movement_axes(&self) -> Vec3 {
        let axis = |positive: KeyCode, negative: KeyCode| {
            self.is_held(positive) as i32 as f32 - self.is_held(negative) as i32 as f32
        };
        Vec3::new(
            axis(KeyCode::KeyW, KeyCode::KeyS),
            axis(KeyCode::KeyD, KeyCode::KeyA),
            axis(KeyCode::Space, KeyCode::ShiftLeft),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_axes() {
        let mut input = InputState::new();
        input.press(KeyCode::KeyW);
        input.press(KeyCode::KeyA);
        input.press(KeyCode::Space);
        input.press(KeyCode::ShiftLeft);
        assert_eq!(input.movement_axes(), Vec3::new(1.0, -1.0, 0.0));

        input.release(KeyCode::KeyW);
        assert_eq!(input.movement_axes().x, 0.0);
    }

    #[test]
    fn test_mouse_delta_is_consumed() {
        let mut input = InputState::new();
        input.add_mouse_delta(3.0, -1.0);
        input.add_mouse_delta(1.0, 0.5);
        assert_eq!(input.take_mouse_delta(), Vec2::new(4.0, -0.5));
        assert_eq!(input.take_mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_ui_focus_drops_pending_motion() {
        let mut input = InputState::new();
        input.add_mouse_delta(10.0, 10.0);
        assert!(input.toggle_ui_focus());
        assert_eq!(input.take_mouse_delta(), Vec2::ZERO);
    }
}
