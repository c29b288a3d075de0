use super::Rect;
use crate::color::{Yuv, YuvA};
use crate::frame::{Nv12FrameMut, PlaneMut, Subsampling, CHROMA, LUMA};

/// `(alpha*fg + (256-alpha)*bg) >> 8`.
///
/// The 256 complement is what existing overlays were produced with, so a
/// fully opaque alpha of 255 still lets 1/256 of the background through.
#[inline]
pub fn mix(fg: u8, bg: u8, alpha: u8) -> u8 {
    let alpha = alpha as u32;
    ((alpha * fg as u32 + (256 - alpha) * bg as u32) >> 8) as u8
}

fn blend_plane(dst: &mut PlaneMut, sub: Subsampling, rect: Rect, sample: &[u8], alpha: u8) {
    let bps = sub.bytes_per_sample;
    let x_start = (rect.x as usize).next_multiple_of(bps);
    let x_end = rect.right() as usize;
    let y_start = (rect.y as usize).next_multiple_of(sub.vertical);
    let y_end = (rect.bottom() as usize).min(dst.rows() * sub.vertical);

    for py in (y_start..y_end).step_by(sub.vertical) {
        let Some(row) = dst.row_mut(py / sub.vertical) else {
            break;
        };
        let end = x_end.min(row.len());
        let mut px = x_start;
        while px < end && px + bps <= row.len() {
            for (out, &fg) in row[px..px + bps].iter_mut().zip(sample) {
                *out = mix(fg, *out, alpha);
            }
            px += bps;
        }
    }
}

/// Blends a flat color into `rect`, clipped to the frame.
pub fn blend_rect(dst: &mut Nv12FrameMut, rect: Rect, color: YuvA) {
    if rect.is_empty() {
        return;
    }
    blend_plane(dst.y_mut(), LUMA, rect, &[color.y], color.alpha);
    blend_plane(dst.uv_mut(), CHROMA, rect, &[color.u, color.v], color.alpha);
}

#[inline]
fn sample_at<'p>(
    plane: &'p mut PlaneMut,
    sub: Subsampling,
    x: usize,
    y: usize,
) -> Option<&'p mut [u8]> {
    if !sub.owns(x, y) {
        return None;
    }
    let row = plane.row_mut(y / sub.vertical)?;
    row.get_mut(x..x + sub.bytes_per_sample)
}

/// Blends one pixel by `coverage`. Zero coverage leaves the frame untouched.
#[inline]
pub fn blend_pixel(dst: &mut Nv12FrameMut, x: usize, y: usize, color: Yuv, coverage: u8) {
    if coverage == 0 {
        return;
    }
    if let Some(px) = sample_at(dst.y_mut(), LUMA, x, y) {
        px[0] = mix(color.y, px[0], coverage);
    } else {
        return;
    }
    if let Some(pair) = sample_at(dst.uv_mut(), CHROMA, x, y) {
        pair[0] = mix(color.u, pair[0], coverage);
        pair[1] = mix(color.v, pair[1], coverage);
    }
}

/// Opaque single-pixel write.
#[inline]
pub fn put_pixel(dst: &mut Nv12FrameMut, x: usize, y: usize, color: Yuv) {
    if let Some(px) = sample_at(dst.y_mut(), LUMA, x, y) {
        px[0] = color.y;
    } else {
        return;
    }
    if let Some(pair) = sample_at(dst.uv_mut(), CHROMA, x, y) {
        pair[0] = color.u;
        pair[1] = color.v;
    }
}
