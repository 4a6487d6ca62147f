use log::{debug, trace};
use macroquad::prelude::*;

use crate::scene::{self, Scene, TextItem, TextMetrics, TextSize, ViewportSize};
use crate::view::ViewTransform;
use crate::waveform::Waveform;

const BACKGROUND: Color = WHITE;
const TITLE_FILL: Color = LIGHTGRAY;
const TITLE_TEXT: Color = BLACK;
const FRAME_FILL: Color = BLACK;
const SIGNAL: Color = GREEN;
const LABEL_TEXT: Color = WHITE;
const SIGNAL_THICKNESS: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct CacheKey {
    size: ViewportSize,
    view: ViewTransform,
}

/// Retained surface reused until the viewport or the view transform changes.
pub struct RasterCache<S> {
    entry: Option<(CacheKey, S)>,
    rebuilds: u64,
}

impl<S> Default for RasterCache<S> {
    fn default() -> Self {
        Self {
            entry: None,
            rebuilds: 0,
        }
    }
}

impl<S> RasterCache<S> {
    pub fn valid_for(&self, size: ViewportSize, view: &ViewTransform) -> bool {
        matches!(&self.entry, Some((key, _)) if key.size == size && key.view == *view)
    }

    pub fn is_dirty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Returns the cached surface, calling `build` first when it is missing or stale.
    pub fn present(
        &mut self,
        size: ViewportSize,
        view: &ViewTransform,
        build: impl FnOnce() -> S,
    ) -> &S {
        if !self.valid_for(size, view) {
            self.entry = None;
        }
        let key = CacheKey { size, view: *view };
        let (_, surface) = self.entry.get_or_insert_with(|| {
            self.rebuilds += 1;
            (key, build())
        });
        surface
    }
}

pub struct MacroquadText;

impl TextMetrics for MacroquadText {
    fn measure(&self, text: &str, font_size: u16) -> TextSize {
        let dimensions = measure_text(text, None, font_size, 1.0);
        TextSize {
            width: dimensions.width,
            height: dimensions.height,
        }
    }
}

#[derive(Default)]
pub struct Renderer {
    cache: RasterCache<RenderTarget>,
}

impl Renderer {
    pub fn invalidate(&mut self) {
        if !self.cache.is_dirty() {
            trace!("raster invalidated after {} builds", self.cache.rebuilds());
        }
        self.cache.invalidate();
    }

    pub fn present(
        &mut self,
        waveform: &Waveform,
        view: &ViewTransform,
        size: ViewportSize,
    ) -> &Texture2D {
        let target = self.cache.present(size, view, || {
            let scene = scene::build_scene(waveform, view, size, &MacroquadText);
            debug!(
                "raster rebuild {}x{} zoom={:.3} offset={:.1}: {} segments, {} labels",
                size.width,
                size.height,
                view.zoom(),
                view.offset_x(),
                scene.path.len(),
                scene.labels.len()
            );
            rasterize(&scene)
        });
        &target.texture
    }
}

fn rasterize(scene: &Scene) -> RenderTarget {
    let width = scene.size.width.max(1);
    let height = scene.size.height.max(1);
    let target = render_target(width, height);
    target.texture.set_filter(FilterMode::Nearest);

    let (w, h) = (width as f32, height as f32);
    set_camera(&Camera2D {
        zoom: vec2(2.0 / w, 2.0 / h),
        target: vec2(w * 0.5, h * 0.5),
        render_target: Some(target.clone()),
        ..Default::default()
    });

    clear_background(BACKGROUND);
    paint_title(scene);
    paint_frame(scene);
    paint_path(scene);
    for label in &scene.labels {
        paint_text(label, LABEL_TEXT);
    }

    set_default_camera();
    target
}

fn paint_title(scene: &Scene) {
    let title = scene.layout.title;
    draw_rectangle(title.x, title.y, title.w, title.h, TITLE_FILL);
    paint_text(&scene.title, TITLE_TEXT);
}

fn paint_frame(scene: &Scene) {
    let frame = scene.layout.frame;
    if frame.w > 0.0 && frame.h > 0.0 {
        draw_rectangle(frame.x, frame.y, frame.w, frame.h, FRAME_FILL);
    }
}

fn paint_path(scene: &Scene) {
    for (start, end) in &scene.path {
        draw_line(start.x, start.y, end.x, end.y, SIGNAL_THICKNESS, SIGNAL);
    }
}

fn paint_text(item: &TextItem, color: Color) {
    draw_text_ex(
        &item.text,
        item.x,
        item.baseline,
        TextParams {
            font_size: item.font_size,
            color,
            ..Default::default()
        },
    );
}
