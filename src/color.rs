//! RGB24 to NV12 conversion (BT.601, video range)
//!
//! Hardware encoders downstream expect video-range samples, so the integer
//! formulas below are kept bit-exact.

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};
use crate::frame::Nv12FrameMut;

/// One Y/U/V sample triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Yuv {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl Yuv {
    pub const fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }
}

/// Flat color plus blend alpha (0 = transparent, 255 = nearly opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YuvA {
    pub y: u8,
    pub u: u8,
    pub v: u8,
    pub alpha: u8,
}

impl YuvA {
    pub const fn new(y: u8, u: u8, v: u8, alpha: u8) -> Self {
        Self { y, u, v, alpha }
    }

    pub fn color(&self) -> Yuv {
        Yuv::new(self.y, self.u, self.v)
    }
}

#[inline]
fn luma(r: i32, g: i32, b: i32) -> u8 {
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16).clamp(16, 235) as u8
}

#[inline]
fn chroma(r: i32, g: i32, b: i32) -> (u8, u8) {
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (u.clamp(16, 240) as u8, v.clamp(16, 240) as u8)
}

pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> Yuv {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let (u, v) = chroma(r, g, b);
    Yuv::new(luma(r, g, b), u, v)
}

/// Converts row-major RGB24 into `dst`, which must have the same geometry.
///
/// Chroma is taken from the top-left pixel of each 2x2 block.
pub fn rgb24_to_nv12(rgb: &[u8], width: u32, height: u32, dst: &mut Nv12FrameMut) -> Result<()> {
    let (w, h) = (width as usize, height as usize);
    if rgb.len() < w * h * 3 {
        return Err(OverlayError::invalid_frame(format!(
            "rgb buffer holds {} bytes, {}x{} needs {}",
            rgb.len(),
            width,
            height,
            w * h * 3
        )));
    }
    if dst.width() != width || dst.height() != height {
        return Err(OverlayError::invalid_frame(format!(
            "destination is {}x{}, source is {}x{}",
            dst.width(),
            dst.height(),
            width,
            height
        )));
    }
    if w == 0 || h == 0 {
        return Ok(());
    }

    for (py, src_row) in rgb.chunks_exact(w * 3).take(h).enumerate() {
        if let Some(y_row) = dst.y_mut().row_mut(py) {
            for (out, px) in y_row.iter_mut().zip(src_row.chunks_exact(3)) {
                *out = luma(px[0] as i32, px[1] as i32, px[2] as i32);
            }
        }

        if py % 2 != 0 {
            continue;
        }
        if let Some(uv_row) = dst.uv_mut().row_mut(py / 2) {
            for (pair, px) in uv_row.chunks_exact_mut(2).zip(src_row.chunks_exact(6)) {
                let (u, v) = chroma(px[0] as i32, px[1] as i32, px[2] as i32);
                pair[0] = u;
                pair[1] = v;
            }
            // Odd widths leave one trailing pixel outside chunks_exact(6).
            if w % 2 == 1 {
                let last = &src_row[(w - 1) * 3..w * 3];
                let (u, v) = chroma(last[0] as i32, last[1] as i32, last[2] as i32);
                let n = uv_row.len();
                uv_row[n - 2] = u;
                uv_row[n - 1] = v;
            }
        }
    }

    Ok(())
}
