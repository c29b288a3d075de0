//! NV12 plane operations
//!
//! Every routine here is written once against a [`PlaneMut`](crate::frame::PlaneMut)
//! and a [`Subsampling`](crate::frame::Subsampling), then applied to the luma
//! and chroma planes in turn. Writes outside the destination are clipped.

pub mod blend;
pub mod copy;
pub mod scale;

pub use blend::{blend_pixel, blend_rect, put_pixel};
pub use copy::{copy_frame, copy_plane, fill_frame, NEUTRAL_FILL};
pub use scale::{scale_frame, scale_plane};

/// Axis-aligned rectangle in full-resolution pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }
}
