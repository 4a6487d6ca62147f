use macroquad::prelude::{Rect, Vec2, vec2};

use crate::downsample;
use crate::view::ViewTransform;
use crate::waveform::Waveform;

pub const TITLE_HEIGHT: f32 = 30.0;
pub const TITLE_PADDING: f32 = 10.0;
pub const TITLE_FONT_SIZE: u16 = 18;
pub const LABEL_FONT_SIZE: u16 = 13;
const FRAME_GAP: f32 = 10.0;
const FRAME_MARGIN: f32 = 20.0;
const PLOT_PADDING: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

pub trait TextMetrics {
    fn measure(&self, text: &str, font_size: u16) -> TextSize;
}

/// Geometry of one raster build, derived from the viewport size and sample count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub title: Rect,
    pub frame: Rect,
    /// Drawable area inside the frame; value 0 sits on its bottom edge, value 1 on its top.
    pub plot: Rect,
    /// Pixels between consecutive samples at zoom 1.
    pub base_scale: f32,
}

impl Layout {
    pub fn compute(size: ViewportSize, sample_count: usize) -> Self {
        let width = size.width as f32;
        let height = size.height as f32;

        let title = Rect::new(0.0, 0.0, width, TITLE_HEIGHT);
        let frame = Rect::new(
            FRAME_MARGIN,
            TITLE_HEIGHT + FRAME_GAP,
            width - 2.0 * FRAME_MARGIN,
            height / 3.0,
        );
        let plot = Rect::new(
            frame.x + PLOT_PADDING,
            frame.y + PLOT_PADDING,
            frame.w - 2.0 * PLOT_PADDING,
            frame.h - 2.0 * PLOT_PADDING,
        );
        let intervals = sample_count.saturating_sub(1).max(1);
        let base_scale = plot.w / intervals as f32;

        Self {
            title,
            frame,
            plot,
            base_scale,
        }
    }

    pub fn origin_x(&self) -> f32 {
        self.plot.x
    }

    fn has_plot(&self) -> bool {
        self.plot.w > 0.0
            && self.plot.h > 0.0
            && self.base_scale.is_finite()
            && self.base_scale > 0.0
    }

    fn screen_x(&self, view: &ViewTransform, index: f32) -> f32 {
        view.sample_to_screen_x(index, self.plot.x, self.base_scale)
    }

    fn sample_at(&self, view: &ViewTransform, x: f32) -> f32 {
        view.screen_to_sample(x, self.plot.x, self.base_scale)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub font_size: u16,
}

pub type Segment = (Vec2, Vec2);

/// Everything one raster shows, in paint order: title, frame, path, labels.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub size: ViewportSize,
    pub layout: Layout,
    pub title: TextItem,
    pub path: Vec<Segment>,
    pub labels: Vec<TextItem>,
}

pub fn build_scene(
    waveform: &Waveform,
    view: &ViewTransform,
    size: ViewportSize,
    metrics: &impl TextMetrics,
) -> Scene {
    let layout = Layout::compute(size, waveform.len());
    Scene {
        size,
        title: title_text(&waveform.metadata().name, &layout, metrics),
        path: signal_path(waveform.samples(), &layout, view),
        labels: time_labels(waveform, &layout, view, metrics),
        layout,
    }
}

fn title_text(name: &str, layout: &Layout, metrics: &impl TextMetrics) -> TextItem {
    let measure = metrics.measure(name, TITLE_FONT_SIZE);
    TextItem {
        text: name.to_owned(),
        x: layout.title.x + TITLE_PADDING,
        baseline: layout.title.y + layout.title.h * 0.5 + measure.height * 0.5,
        font_size: TITLE_FONT_SIZE,
    }
}

fn signal_path(samples: &[u8], layout: &Layout, view: &ViewTransform) -> Vec<Segment> {
    if samples.len() < 2 || !layout.has_plot() {
        return Vec::new();
    }
    let step = downsample::stride(samples.len(), layout.plot.w);
    let first = layout.sample_at(view, layout.frame.left());
    let last = layout.sample_at(view, layout.frame.right());
    let Some(indices) = downsample::visible_vertices(samples.len(), step, first, last) else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut previous: Option<Vec2> = None;
    for index in indices {
        let point = vec2(
            layout.screen_x(view, index as f32),
            ViewTransform::value_to_screen_y(
                samples[index] as f32,
                layout.plot.bottom(),
                layout.plot.h,
            ),
        );
        if let Some(start) = previous {
            if let Some(segment) = clip_segment(start, point, &layout.frame) {
                segments.push(segment);
            }
        }
        previous = Some(point);
    }
    segments
}

/// Liang-Barsky clip of the segment `a -> b` against `rect`.
fn clip_segment(a: Vec2, b: Vec2, rect: &Rect) -> Option<Segment> {
    let delta = b - a;
    let mut enter = 0.0f32;
    let mut exit = 1.0f32;
    let edges = [
        (-delta.x, a.x - rect.left()),
        (delta.x, rect.right() - a.x),
        (-delta.y, a.y - rect.top()),
        (delta.y, rect.bottom() - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > exit {
                return None;
            }
            enter = enter.max(t);
        } else {
            if t < enter {
                return None;
            }
            exit = exit.min(t);
        }
    }
    Some((a + delta * enter, a + delta * exit))
}

fn time_labels(
    waveform: &Waveform,
    layout: &Layout,
    view: &ViewTransform,
    metrics: &impl TextMetrics,
) -> Vec<TextItem> {
    let metadata = waveform.metadata();
    let Some(timestep) = metadata.timestep else {
        return Vec::new();
    };
    let Some(last_index) = waveform.len().checked_sub(1) else {
        return Vec::new();
    };
    if !layout.has_plot() {
        return Vec::new();
    }
    let last_index = last_index as u64;
    let per_ms = metadata.time_unit().per_millisecond();
    let frame = layout.frame;

    // Ticks before this one all land left of the frame.
    let first_visible = layout.sample_at(view, frame.left()).ceil().max(0.0) as u64;
    if first_visible > last_index {
        return Vec::new();
    }
    let mut tick = (first_visible.saturating_mul(timestep) / per_ms).max(1);

    // At most one label per pixel column; each pass moves at least one column right.
    let columns = frame.w.max(0.0) as usize + 2;
    let mut labels = Vec::new();
    for _ in 0..columns {
        let index = tick.saturating_mul(per_ms) / timestep;
        if index > last_index {
            break;
        }
        let x = layout.screen_x(view, index as f32);
        if x > frame.right() {
            break;
        }
        if x >= frame.left() {
            labels.push(time_label(tick, x, layout, metrics));
        }

        let next_column = (x.floor() + 1.0).max(frame.left());
        let next_index = (layout.sample_at(view, next_column).ceil() as u64).max(index + 1);
        tick = next_index
            .saturating_mul(timestep)
            .div_ceil(per_ms)
            .max(tick + 1);
    }
    labels
}

fn time_label(tick: u64, x: f32, layout: &Layout, metrics: &impl TextMetrics) -> TextItem {
    let frame = layout.frame;
    let text = format!("{tick}ms");
    let measure = metrics.measure(&text, LABEL_FONT_SIZE);
    let mut text_x = x - measure.width / 2.0;
    if text_x < frame.left() {
        text_x = frame.left();
    }
    if text_x + measure.width > frame.right() {
        text_x = frame.right() - measure.width;
    }
    TextItem {
        text,
        x: text_x,
        baseline: layout.plot.bottom() + measure.height,
        font_size: LABEL_FONT_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: ViewportSize = ViewportSize {
        width: 1000,
        height: 600,
    };

    struct FixedMetrics;

    impl TextMetrics for FixedMetrics {
        fn measure(&self, text: &str, font_size: u16) -> TextSize {
            TextSize {
                width: text.chars().count() as f32 * 7.0,
                height: font_size as f32 * 0.75,
            }
        }
    }

    fn waveform(text: &str) -> Waveform {
        Waveform::parse(text.as_bytes()).unwrap()
    }

    fn toggling(count: usize, header: &str) -> Waveform {
        let mut text = format!("{header}DATA;\n");
        for index in 0..count {
            text.push_str(if index % 2 == 0 { "0\n" } else { "1\n" });
        }
        waveform(&text)
    }

    fn scene(waveform: &Waveform, view: &ViewTransform) -> Scene {
        build_scene(waveform, view, SIZE, &FixedMetrics)
    }

    fn near(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-2
    }

    fn label_texts(scene: &Scene) -> Vec<&str> {
        scene.labels.iter().map(|label| label.text.as_str()).collect()
    }

    #[test]
    fn layout_matches_viewport() {
        let layout = Layout::compute(SIZE, 11);
        assert_eq!(layout.title, Rect::new(0.0, 0.0, 1000.0, 30.0));
        assert_eq!(layout.frame, Rect::new(20.0, 40.0, 960.0, 200.0));
        assert_eq!(layout.plot, Rect::new(40.0, 60.0, 920.0, 160.0));
        assert_eq!(layout.base_scale, 92.0);
        assert_eq!(layout.origin_x(), 40.0);
    }

    #[test]
    fn title_is_padded_and_centered() {
        let scene = scene(&Waveform::empty("data.txt"), &ViewTransform::default());
        assert_eq!(scene.title.text, "data.txt");
        assert_eq!(scene.title.x, TITLE_PADDING);
        assert_eq!(scene.title.baseline, 15.0 + TITLE_FONT_SIZE as f32 * 0.375);
    }

    #[test]
    fn empty_waveform_renders_frame_only() {
        let scene = scene(&waveform("DATA;\n"), &ViewTransform::default());
        assert!(scene.path.is_empty());
        assert!(scene.labels.is_empty());
        assert_eq!(scene.layout.frame.w, 960.0);
    }

    #[test]
    fn single_sample_draws_no_path() {
        let scene = scene(&waveform("DATA;\n1\n"), &ViewTransform::default());
        assert!(scene.path.is_empty());
    }

    #[test]
    fn path_spans_the_plot_at_default_view() {
        let wave = waveform("TIMESTEP;100;\nUNITS;ms;\nDATA;\n0\n1\n1\n0\n");
        let scene = scene(&wave, &ViewTransform::default());
        let plot = scene.layout.plot;
        assert_eq!(scene.path.len(), 3);
        assert!(near(scene.path[0].0, vec2(plot.left(), plot.bottom())));
        assert!(near(scene.path[0].1, vec2(plot.left() + plot.w / 3.0, plot.top())));
        assert!(near(scene.path[2].1, vec2(plot.right(), plot.bottom())));
    }

    #[test]
    fn path_is_clipped_to_the_frame() {
        let wave = toggling(200, "");
        let mut view = ViewTransform::default();
        view.zoom_by(8.0, 500.0, 40.0);
        view.pan_by(-300.0);
        let scene = scene(&wave, &view);
        let frame = scene.layout.frame;
        assert!(!scene.path.is_empty());
        for (a, b) in &scene.path {
            for point in [a, b] {
                assert!(point.x >= frame.left() - 1e-3 && point.x <= frame.right() + 1e-3);
                assert!(point.y >= frame.top() - 1e-3 && point.y <= frame.bottom() + 1e-3);
            }
        }
        let (leftmost, _) = scene.path[0];
        let (_, rightmost) = scene.path[scene.path.len() - 1];
        assert!((leftmost.x - frame.left()).abs() < 1e-2);
        assert!((rightmost.x - frame.right()).abs() < 1e-2);
    }

    #[test]
    fn path_panned_out_of_view_is_empty() {
        let wave = toggling(50, "");
        let mut view = ViewTransform::default();
        view.pan_by(5_000.0);
        assert!(scene(&wave, &view).path.is_empty());
        view.pan_by(-12_000.0);
        assert!(scene(&wave, &view).path.is_empty());
    }

    #[test]
    fn large_inputs_stay_within_pixel_budget() {
        let wave = toggling(1_000_000, "");
        let scene = scene(&wave, &ViewTransform::default());
        assert!(!scene.path.is_empty());
        assert!(scene.path.len() <= scene.layout.plot.w as usize + 1);
    }

    #[test]
    fn labels_follow_millisecond_ticks() {
        let wave = toggling(20, "TIMESTEP;250;\nUNITS;us;\n");
        let scene = scene(&wave, &ViewTransform::default());
        assert_eq!(label_texts(&scene), ["1ms", "2ms", "3ms", "4ms"]);

        let layout = scene.layout;
        let tick_x = layout.plot.x + 4.0 * layout.base_scale;
        let first = &scene.labels[0];
        assert!((first.x - (tick_x - 3.0 * 7.0 / 2.0)).abs() < 1e-3);
        assert_eq!(first.baseline, layout.plot.bottom() + LABEL_FONT_SIZE as f32 * 0.75);
        assert_eq!(first.font_size, LABEL_FONT_SIZE);
    }

    #[test]
    fn nanosecond_units_scale_ticks() {
        let wave = toggling(10, "TIMESTEP;400000;\nUNITS;ns;\n");
        let scene = scene(&wave, &ViewTransform::default());
        // index = t * 1_000_000 / 400_000
        assert_eq!(label_texts(&scene), ["1ms", "2ms", "3ms"]);
    }

    #[test]
    fn labels_are_clamped_inside_the_frame() {
        let wave = toggling(5, "TIMESTEP;1;\n");
        let mut view = ViewTransform::default();
        view.pan_by(15.0);
        let scene = scene(&wave, &view);
        assert_eq!(label_texts(&scene), ["1ms", "2ms", "3ms", "4ms"]);
        let last = scene.labels.last().unwrap();
        assert_eq!(last.x, scene.layout.frame.right() - 3.0 * 7.0);

        let mut view = ViewTransform::default();
        view.pan_by(-245.0);
        let scene = self::scene(&wave, &view);
        let first = &scene.labels[0];
        assert_eq!(first.text, "1ms");
        assert_eq!(first.x, scene.layout.frame.left());
    }

    #[test]
    fn labels_left_of_frame_are_skipped() {
        let wave = toggling(100, "TIMESTEP;1;\n");
        let mut view = ViewTransform::default();
        view.zoom_by(4.0, 40.0, 40.0);
        view.pan_by(-1_000.0);
        let scene = scene(&wave, &view);
        let frame = scene.layout.frame;
        let layout = scene.layout;
        assert!(!scene.labels.is_empty());
        let first_tick: u64 = scene.labels[0].text.trim_end_matches("ms").parse().unwrap();
        assert!(view.sample_to_screen_x(first_tick as f32, layout.origin_x(), layout.base_scale) >= frame.left());
        assert!(view.sample_to_screen_x((first_tick - 1) as f32, layout.origin_x(), layout.base_scale) < frame.left());
        let last_tick: u64 = scene.labels.last().unwrap().text.trim_end_matches("ms").parse().unwrap();
        assert!(last_tick < 99);
    }

    #[test]
    fn labels_need_a_timestep() {
        let wave = toggling(20, "TIMESTEP;abc;\nUNITS;ms;\n");
        assert!(scene(&wave, &ViewTransform::default()).labels.is_empty());
        let wave = toggling(20, "UNITS;ms;\n");
        assert!(scene(&wave, &ViewTransform::default()).labels.is_empty());
    }

    #[test]
    fn coarse_timesteps_label_each_sample_once() {
        let wave = toggling(3, "TIMESTEP;1000;\n");
        let scene = scene(&wave, &ViewTransform::default());
        assert_eq!(label_texts(&scene), ["1ms", "1000ms", "2000ms"]);
    }

    #[test]
    fn every_visible_sample_gets_its_label() {
        let wave = toggling(10, "TIMESTEP;1000;\n");
        let scene = scene(&wave, &ViewTransform::default());
        let expected: Vec<String> = std::iter::once("1ms".to_owned())
            .chain((1..10).map(|second| format!("{}ms", second * 1000)))
            .collect();
        assert_eq!(label_texts(&scene), expected);
    }

    #[test]
    fn dense_ticks_get_at_most_one_label_per_column() {
        let wave = toggling(1_000_000, "TIMESTEP;1;\n");
        let scene = scene(&wave, &ViewTransform::default());
        let frame = scene.layout.frame;
        assert!(scene.labels.len() > 100);
        assert!(scene.labels.len() <= frame.w as usize + 1);
        assert_eq!(scene.labels[0].text, "1ms");

        let mut view = ViewTransform::default();
        view.zoom_by(40.0, 40.0, 40.0);
        let zoomed = self::scene(&wave, &view);
        assert!(zoomed.labels.len() <= frame.w as usize + 1);
        assert_eq!(zoomed.labels[0].text, "1ms");
    }

    #[test]
    fn samples_just_over_the_plot_width_keep_their_edges() {
        let wave = toggling(921, "");
        let scene = scene(&wave, &ViewTransform::default());
        let top = scene.layout.plot.top();
        assert_eq!(scene.path.len(), 920);
        assert!(scene.path.iter().any(|(a, _)| (a.y - top).abs() < 1e-3));

        let mut view = ViewTransform::default();
        view.zoom_by(40.0, 500.0, 40.0);
        let zoomed = self::scene(&wave, &view);
        assert!(zoomed.path.iter().any(|(a, b)| (a.y - top).abs() < 1e-3 || (b.y - top).abs() < 1e-3));
    }

    #[test]
    fn short_viewports_draw_no_inverted_path() {
        let wave = toggling(30, "TIMESTEP;1;\n");
        let size = ViewportSize::new(1000, 100);
        let layout = Layout::compute(size, wave.len());
        assert!(layout.plot.h < 0.0);
        let scene = build_scene(&wave, &ViewTransform::default(), size, &FixedMetrics);
        assert!(scene.path.is_empty());
        assert!(scene.labels.is_empty());
    }

    #[test]
    fn tiny_viewport_is_still_paintable() {
        let wave = toggling(30, "TIMESTEP;1;\n");
        let scene = build_scene(&wave, &ViewTransform::default(), ViewportSize::new(50, 20), &FixedMetrics);
        assert!(scene.path.is_empty());
        assert!(scene.labels.is_empty());
    }
}
