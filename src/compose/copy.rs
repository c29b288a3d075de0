use crate::color::Yuv;
use crate::frame::{Nv12Frame, Nv12FrameMut, Plane, PlaneMut, CHROMA, LUMA};

/// Dark neutral gray used when no background is configured.
pub const NEUTRAL_FILL: Yuv = Yuv::new(32, 128, 128);

/// Copies the overlapping area of `src` into `dst`.
///
/// Identical layouts are copied as one block; otherwise rows are copied one
/// at a time so differing stride padding is absorbed.
pub fn copy_plane(src: &Plane, dst: &mut PlaneMut) {
    if src.stride() == dst.stride() && src.width() == dst.width() && src.rows() == dst.rows() {
        dst.as_bytes_mut().copy_from_slice(src.as_bytes());
        return;
    }

    let width = src.width().min(dst.width());
    for index in 0..src.rows().min(dst.rows()) {
        if let (Some(from), Some(to)) = (src.row(index), dst.row_mut(index)) {
            to[..width].copy_from_slice(&from[..width]);
        }
    }
}

pub fn copy_frame(src: &Nv12Frame, dst: &mut Nv12FrameMut) {
    for sub in [LUMA, CHROMA] {
        copy_plane(&src.plane(sub), dst.plane_mut(sub));
    }
}

pub fn fill_frame(dst: &mut Nv12FrameMut, color: Yuv) {
    dst.y_mut().fill(&[color.y]);
    if color.u == color.v {
        dst.uv_mut().fill(&[color.u]);
    } else {
        dst.uv_mut().fill(&[color.u, color.v]);
    }
}
