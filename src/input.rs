use log::debug;
use macroquad::miniquad::{CursorIcon, window::set_mouse_cursor};
use macroquad::prelude::*;

use crate::controller::{Gesture, PointerButton};
use crate::scene::ViewportSize;

const DOUBLE_CLICK_SECONDS: f64 = 0.4;
const DOUBLE_CLICK_DISTANCE: f32 = 4.0;
const BUTTONS: [(MouseButton, PointerButton); 3] = [
    (MouseButton::Left, PointerButton::Primary),
    (MouseButton::Right, PointerButton::Secondary),
    (MouseButton::Middle, PointerButton::Middle),
];

/// macroquad has no double-click event; two close presses of the same button make one.
#[derive(Default)]
pub struct DoubleClickDetector {
    last_press: Option<(PointerButton, f64, Vec2)>,
}

impl DoubleClickDetector {
    pub fn press(&mut self, button: PointerButton, time: f64, position: Vec2) -> bool {
        match self.last_press {
            Some((previous_button, previous, origin))
                if previous_button == button
                    && time - previous <= DOUBLE_CLICK_SECONDS
                    && origin.distance(position) <= DOUBLE_CLICK_DISTANCE =>
            {
                self.last_press = None;
                true
            }
            _ => {
                self.last_press = Some((button, time, position));
                false
            }
        }
    }
}

/// Polls the macroquad window once per frame and reports what changed as gestures.
#[derive(Default)]
pub struct HostInput {
    size: Option<ViewportSize>,
    mouse: Option<Vec2>,
    clicks: DoubleClickDetector,
    grabbing: bool,
}

impl HostInput {
    pub fn poll(&mut self) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        let size = current_size();
        if self.size != Some(size) {
            if self.size.is_some() {
                debug!("viewport resized to {}x{}", size.width, size.height);
                gestures.push(Gesture::Resize {
                    width: size.width,
                    height: size.height,
                });
            }
            self.size = Some(size);
        }

        let (x, y) = mouse_position();
        let position = vec2(x, y);
        if self.mouse.is_some_and(|previous| previous != position) {
            gestures.push(Gesture::PointerMove { position });
        }
        self.mouse = Some(position);

        for (mouse_button, button) in BUTTONS {
            if is_mouse_button_pressed(mouse_button) {
                gestures.push(Gesture::PointerDown { button, position });
                if self.clicks.press(button, get_time(), position) {
                    gestures.push(Gesture::DoubleClick { position });
                }
            }
            if is_mouse_button_released(mouse_button) {
                gestures.push(Gesture::PointerUp { button });
            }
        }

        let (_x, wheel) = mouse_wheel();
        if wheel.abs() > f32::EPSILON {
            gestures.push(Gesture::Scroll {
                delta_y: wheel,
                pointer_x: position.x,
                modifier: zoom_modifier_down(),
            });
        }

        gestures
    }

    pub fn size(&self) -> ViewportSize {
        self.size.unwrap_or_else(current_size)
    }

    pub fn set_grabbing(&mut self, grabbing: bool) {
        if self.grabbing != grabbing {
            self.grabbing = grabbing;
            set_mouse_cursor(if grabbing {
                CursorIcon::Move
            } else {
                CursorIcon::Default
            });
        }
    }
}

fn current_size() -> ViewportSize {
    ViewportSize::new(screen_width().max(0.0) as u32, screen_height().max(0.0) as u32)
}

fn zoom_modifier_down() -> bool {
    [
        KeyCode::LeftControl,
        KeyCode::RightControl,
        KeyCode::LeftSuper,
        KeyCode::RightSuper,
    ]
    .into_iter()
    .any(is_key_down)
}
