use super::Rect;
use crate::frame::{Nv12Frame, Nv12FrameMut, Plane, PlaneMut, Subsampling, CHROMA, LUMA};

/// 16.16 fixed-point ratio between a source and destination extent.
#[inline]
fn ratio(src: u32, dst: u32) -> u64 {
    ((src as u64) << 16) / dst as u64
}

/// Nearest-neighbor blit of a whole source plane into `rect` of `dst`.
///
/// `src_size` and `rect` are in full-resolution pixels; `sub` maps them onto
/// the plane. Horizontal sample offsets are aligned down to a whole sample so
/// interleaved U/V pairs stay together.
pub fn scale_plane(
    src: &Plane,
    src_size: (u32, u32),
    dst: &mut PlaneMut,
    rect: Rect,
    sub: Subsampling,
) {
    let (src_w, src_h) = src_size;
    let bps = sub.bytes_per_sample;
    if rect.is_empty() || src_w == 0 || src_h == 0 || src.rows() == 0 || src.width() < bps {
        return;
    }

    let scale_x = ratio(src_w, rect.w);
    let scale_y = ratio(src_h, rect.h);
    let last_src_row = src.rows() - 1;
    let first_row = rect.y as usize / sub.vertical;
    // Odd heights own a trailing half-height chroma row.
    let dst_rows = (rect.bottom() as usize).div_ceil(sub.vertical) - first_row;

    for dy in 0..dst_rows {
        let Some(dst_row) = dst.row_mut(first_row + dy) else {
            break;
        };
        let sy = (((dy as u64 * scale_y) >> 16) as usize).min(last_src_row);
        let Some(src_row) = src.row(sy) else {
            continue;
        };
        let last_sample = (src_row.len() - bps) / bps * bps;

        for dx in (0..rect.w as usize).step_by(bps) {
            let px = rect.x as usize + dx;
            if px + bps > dst_row.len() {
                break;
            }
            let sx = ((((dx as u64 * scale_x) >> 16) as usize) / bps * bps).min(last_sample);
            dst_row[px..px + bps].copy_from_slice(&src_row[sx..sx + bps]);
        }
    }
}

/// Scales all of `src` into `rect` of `dst`, luma then chroma.
pub fn scale_frame(src: &Nv12Frame, dst: &mut Nv12FrameMut, rect: Rect) {
    let size = (src.width(), src.height());
    for sub in [LUMA, CHROMA] {
        scale_plane(&src.plane(sub), size, dst.plane_mut(sub), rect, sub);
    }
}
