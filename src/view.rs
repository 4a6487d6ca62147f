pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 40.0;
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Horizontal zoom and pan applied to the signal plot.
///
/// Screen positions are measured in pixels. `origin_x` is the left edge of the
/// drawable plot area and `base_scale` the pixel distance between two samples at
/// zoom 1; both come from the current layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    offset_x: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            offset_x: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn offset_x(&self) -> f32 {
        self.offset_x
    }

    pub fn sample_to_screen_x(&self, index: f32, origin_x: f32, base_scale: f32) -> f32 {
        origin_x + index * base_scale * self.zoom + self.offset_x
    }

    /// Fractional sample index under screen `x`. Requires `base_scale > 0`.
    pub fn screen_to_sample(&self, x: f32, origin_x: f32, base_scale: f32) -> f32 {
        (x - origin_x - self.offset_x) / (base_scale * self.zoom)
    }

    /// Value 0 sits on `bottom`, value 1 one full `height` above it.
    pub fn value_to_screen_y(value: f32, bottom: f32, height: f32) -> f32 {
        bottom - value * height
    }

    /// Scales the zoom by `factor` while the sample under `pivot_x` stays put.
    pub fn zoom_by(&mut self, factor: f32, pivot_x: f32, origin_x: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let old_zoom = self.zoom;
        self.zoom = (old_zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let ratio = self.zoom / old_zoom;
        let pivot = pivot_x - origin_x;
        self.offset_x = (self.offset_x - pivot) * ratio + pivot;
    }

    pub fn pan_by(&mut self, delta_x: f32) {
        self.offset_x += delta_x;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
