use std::iter::StepBy;
use std::ops::Range;

/// Number of samples between two emitted path vertices: whole samples per pixel
/// column of the unzoomed plot, never below one.
pub fn stride(sample_count: usize, drawable_width: f32) -> usize {
    let columns = if drawable_width.is_finite() && drawable_width >= 1.0 {
        drawable_width as usize
    } else {
        1
    };
    (sample_count / columns).max(1)
}

pub fn vertex_indices(sample_count: usize, stride: usize) -> StepBy<Range<usize>> {
    (0..sample_count).step_by(stride.max(1))
}

/// The run of `vertex_indices` spanning the fractional index window `[first, last]`:
/// from the last vertex at or before `first` to the first vertex at or after `last`.
pub fn visible_vertices(
    sample_count: usize,
    stride: usize,
    first: f32,
    last: f32,
) -> Option<impl Iterator<Item = usize>> {
    let stride = stride.max(1);
    let final_vertex = sample_count.checked_sub(1)? / stride;
    if !(first <= last) || last < 0.0 || first > (final_vertex * stride) as f32 {
        return None;
    }

    let start = first.max(0.0).floor() as usize / stride;
    let end = (last.ceil() as usize).div_ceil(stride).min(final_vertex);
    Some(
        vertex_indices(sample_count, stride)
            .skip(start)
            .take(end - start + 1),
    )
}
