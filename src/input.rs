use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::screen_to_ndc;

/// Keyboard and pointer state, rebuilt from window events.
///
/// "Pressed" and "released" sets hold edges seen since the last
/// [`begin_frame`](Self::begin_frame).
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    mouse_buttons_released: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    cursor_inside: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget this frame's edges and deltas.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_buttons_pressed.clear();
        self.mouse_buttons_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !self.keys_down.contains(&key) {
                                self.keys_pressed.insert(key);
                            }
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    if !self.mouse_buttons_down.contains(button) {
                        self.mouse_buttons_pressed.insert(*button);
                    }
                    self.mouse_buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                    self.mouse_buttons_released.insert(*button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorEntered { .. } => self.cursor_inside = true,
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    winit::event::MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    winit::event::MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                self.scroll_delta += d;
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered to unfocused windows.
                self.keys_down.clear();
                self.mouse_buttons_down.clear();
            }
            _ => {}
        }
    }

    fn cursor_moved(&mut self, position: Vec2) {
        // The first position after entering has no meaningful delta.
        if self.cursor_inside {
            self.mouse_delta += position - self.mouse_position;
        }
        self.mouse_position = position;
        self.cursor_inside = true;
    }

    fn cursor_left(&mut self) {
        self.cursor_inside = false;
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_buttons_released.contains(&button)
    }

    /// Physical pixels from the top-left corner.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Wheel movement in lines; pixel deltas are scaled to match.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    /// Whether the cursor is currently over the window.
    pub fn cursor_inside(&self) -> bool {
        self.cursor_inside
    }

    /// Pointer in normalized device coordinates, or `None` when the cursor
    /// is outside the window.
    pub fn pointer_ndc(&self, width: u32, height: u32) -> Option<Vec2> {
        if !self.cursor_inside || width == 0 || height == 0 {
            return None;
        }
        Some(screen_to_ndc(
            self.mouse_position,
            width as f32,
            height as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_is_none_until_cursor_arrives() {
        let mut input = Input::new();
        assert_eq!(input.pointer_ndc(800, 600), None);

        input.cursor_moved(Vec2::new(400.0, 300.0));
        assert_eq!(input.pointer_ndc(800, 600), Some(Vec2::ZERO));

        input.cursor_left();
        assert_eq!(input.pointer_ndc(800, 600), None);
    }

    #[test]
    fn reentry_does_not_produce_a_jump() {
        let mut input = Input::new();
        input.cursor_moved(Vec2::new(10.0, 10.0));
        input.cursor_moved(Vec2::new(15.0, 12.0));
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 2.0));

        input.begin_frame();
        input.cursor_left();
        input.cursor_moved(Vec2::new(500.0, 400.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
