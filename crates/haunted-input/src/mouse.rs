//! Frame-coherent mouse state tracker.
//!
//! [`MouseState`] accumulates winit mouse events between redraws and exposes
//! the position, per-frame motion, held buttons, and wheel movement the orbit
//! controls read.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Approximate pixels per wheel line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f64 = 40.0;

/// Per-button press/release tracking for a single frame.
#[derive(Debug, Clone, Copy, Default)]
struct ButtonFrame {
    pressed: bool,
    just_pressed: bool,
    just_released: bool,
}

/// Left, right, and middle. Other buttons are ignored.
fn button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        _ => None,
    }
}

/// Mouse input gathered since the last [`clear_transients`](Self::clear_transients).
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Vec2,
    delta: Vec2,
    has_position: bool,
    buttons: [ButtonFrame; 3],
    scroll: f32,
    cursor_in_window: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Event handlers ──────────────────────────────────────────────

    /// Process a `CursorMoved` event in physical pixels.
    ///
    /// The first reported position only seeds the tracker, so the cursor
    /// entering the window does not register as a drag.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if self.has_position {
            self.delta += new_pos - self.position;
        }
        self.position = new_pos;
        self.has_position = true;
    }

    /// Process a `MouseInput` event.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let Some(idx) = button_index(button) else {
            return;
        };
        let frame = &mut self.buttons[idx];
        match state {
            ElementState::Pressed => {
                frame.pressed = true;
                frame.just_pressed = true;
            }
            ElementState::Released => {
                frame.pressed = false;
                frame.just_released = true;
            }
        }
    }

    /// Process a `MouseWheel` event. Positive values scroll up (away from the user).
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    /// Leaving the window releases every button, since the release event
    /// may never arrive.
    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
        self.has_position = false;
        for frame in &mut self.buttons {
            if frame.pressed {
                frame.pressed = false;
                frame.just_released = true;
            }
        }
    }

    /// Clear per-frame motion, wheel, and edge flags.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
        for frame in &mut self.buttons {
            frame.just_pressed = false;
            frame.just_released = false;
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Cursor movement since the last clear, in physical pixels.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| self.buttons[i].pressed)
    }

    #[must_use]
    pub fn just_button_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| self.buttons[i].just_pressed)
    }

    #[must_use]
    pub fn just_button_released(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| self.buttons[i].just_released)
    }

    /// Wheel lines accumulated since the last clear.
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    #[must_use]
    pub fn is_cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_position_updates_on_move() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        assert_eq!(ms.position(), Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_first_move_is_not_motion() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(500.0, 300.0);
        assert_eq!(ms.delta(), Vec2::ZERO);
    }

    #[test]
    fn test_delta_accumulates_within_frame() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        ms.clear_transients();
        ms.on_cursor_moved(105.0, 198.0);
        ms.on_cursor_moved(110.0, 195.0);
        let d = ms.delta();
        assert!((d.x - 10.0).abs() < f32::EPSILON);
        assert!((d.y - (-5.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_button_press_and_release_tracked() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        assert!(ms.is_button_pressed(MouseButton::Left));
        assert!(ms.just_button_pressed(MouseButton::Left));
        assert!(!ms.is_button_pressed(MouseButton::Right));

        ms.on_button(MouseButton::Left, ElementState::Released);
        assert!(!ms.is_button_pressed(MouseButton::Left));
        assert!(ms.just_button_released(MouseButton::Left));
    }

    #[test]
    fn test_unknown_buttons_ignored() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Back, ElementState::Pressed);
        assert!(!ms.is_button_pressed(MouseButton::Back));
    }

    #[test]
    fn test_scroll_lines_and_pixels() {
        let mut ms = MouseState::new();
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        ms.on_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 20.0)));
        assert!((ms.scroll() - 1.5).abs() < f32::EPSILON);
        ms.clear_transients();
        assert_eq!(ms.scroll(), 0.0);
    }

    #[test]
    fn test_leaving_window_releases_buttons() {
        let mut ms = MouseState::new();
        ms.on_cursor_entered();
        assert!(ms.is_cursor_in_window());
        ms.on_button(MouseButton::Right, ElementState::Pressed);
        ms.on_cursor_left();
        assert!(!ms.is_cursor_in_window());
        assert!(!ms.is_button_pressed(MouseButton::Right));
        assert!(ms.just_button_released(MouseButton::Right));
    }

    #[test]
    fn test_reentry_does_not_jump() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(10.0, 10.0);
        ms.on_cursor_left();
        ms.on_cursor_moved(600.0, 400.0);
        assert_eq!(ms.delta(), Vec2::ZERO);
    }

    #[test]
    fn test_clear_keeps_held_buttons() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.clear_transients();
        assert!(ms.is_button_pressed(MouseButton::Left));
        assert!(!ms.just_button_pressed(MouseButton::Left));
    }
}
