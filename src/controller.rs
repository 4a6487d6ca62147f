use log::{debug, trace};
use macroquad::prelude::Vec2;

use crate::scene::Layout;
use crate::view::ViewTransform;

pub const ZOOM_STEP: f32 = 1.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Input normalized by the host adapter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    PointerDown {
        button: PointerButton,
        position: Vec2,
    },
    PointerMove {
        position: Vec2,
    },
    PointerUp {
        button: PointerButton,
    },
    Scroll {
        delta_y: f32,
        pointer_x: f32,
        modifier: bool,
    },
    DoubleClick {
        position: Vec2,
    },
    Resize {
        width: u32,
        height: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Not handled; the host may apply its default behavior.
    Ignored,
    Consumed,
    /// Handled and the view changed; the raster must be rebuilt.
    Redraw,
}

impl Response {
    pub fn needs_redraw(&self) -> bool {
        matches!(self, Response::Redraw)
    }
}

#[derive(Default)]
pub struct InteractionController {
    view: ViewTransform,
    drag_anchor: Option<Vec2>,
}

impl InteractionController {
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn handle(&mut self, gesture: Gesture, layout: &Layout) -> Response {
        let response = match gesture {
            Gesture::PointerDown {
                button: PointerButton::Primary,
                position,
            } => {
                self.drag_anchor = Some(position);
                Response::Consumed
            }
            Gesture::PointerMove { position } => self.drag_to(position),
            Gesture::PointerUp {
                button: PointerButton::Primary,
            } => {
                if self.drag_anchor.take().is_some() {
                    Response::Consumed
                } else {
                    Response::Ignored
                }
            }
            Gesture::PointerDown { .. } | Gesture::PointerUp { .. } => Response::Ignored,
            Gesture::Scroll {
                delta_y,
                pointer_x,
                modifier,
            } => self.scroll(delta_y, pointer_x, modifier, layout),
            Gesture::DoubleClick { position } => {
                trace!("view reset from double click at {position}");
                self.view.reset();
                Response::Redraw
            }
            Gesture::Resize { width, height } => {
                if self.drag_anchor.take().is_some() {
                    debug!("drag cancelled by resize to {width}x{height}");
                }
                Response::Redraw
            }
        };
        trace!("{gesture:?} -> {response:?} (view={:?})", self.view);
        response
    }

    fn drag_to(&mut self, position: Vec2) -> Response {
        let Some(anchor) = self.drag_anchor else {
            return Response::Ignored;
        };
        let delta = position.x - anchor.x;
        self.drag_anchor = Some(position);
        if delta == 0.0 {
            return Response::Consumed;
        }
        self.view.pan_by(delta);
        Response::Redraw
    }

    fn scroll(&mut self, delta_y: f32, pointer_x: f32, modifier: bool, layout: &Layout) -> Response {
        if !modifier || delta_y == 0.0 {
            return Response::Ignored;
        }
        let factor = if delta_y > 0.0 {
            ZOOM_STEP
        } else {
            1.0 / ZOOM_STEP
        };
        self.view.zoom_by(factor, pointer_x, layout.origin_x());
        Response::Redraw
    }
}
