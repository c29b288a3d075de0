//! Anti-aliased glyphs from a vector font
//!
//! The rasterizer is treated as a process-wide resource that is not safe to
//! drive from several threads at once, even across different faces. Callers
//! go through [`FontGuard`] so every rasterizer call happens under
//! [`FONT_LOCK`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusttype::{point, Font, Scale};
use tracing::{info, instrument};

use super::TextSize;
use crate::color::Yuv;
use crate::compose::blend_pixel;
use crate::error::{OverlayError, Result};
use crate::frame::Nv12FrameMut;

/// Pixel size per unit of text scale.
pub const BASE_FONT_PX: f32 = 8.0;

pub static FONT_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    /// Distance from the top of a line to its baseline.
    pub ascent: i32,
    pub line_height: u32,
}

/// Font collaborator: turns a codepoint and pixel size into coverage.
pub trait GlyphRasterizer: Send + Sync {
    fn line_metrics(&self, px: f32) -> LineMetrics;

    /// Horizontal advance in whole pixels.
    fn advance(&self, ch: char, px: f32) -> u32;

    /// Calls `plot(x, y, coverage)` for every pixel of the glyph whose pen
    /// position is `(x, baseline)`.
    fn draw(&self, ch: char, px: f32, x: i32, baseline: i32, plot: &mut dyn FnMut(i32, i32, u8));
}

/// Holds [`FONT_LOCK`] when at least one vector path is in use.
pub struct FontGuard {
    guard: Option<MutexGuard<'static, ()>>,
}

impl FontGuard {
    pub fn lock() -> Self {
        Self {
            guard: Some(FONT_LOCK.lock().unwrap_or_else(PoisonError::into_inner)),
        }
    }

    pub(crate) fn unlocked() -> Self {
        Self { guard: None }
    }

    pub fn is_locked(&self) -> bool {
        self.guard.is_some()
    }

    /// Locks for the duration of one call unless `self` already holds the lock.
    fn ensure_locked(&self) -> Option<FontGuard> {
        (!self.is_locked()).then(FontGuard::lock)
    }
}

pub struct RustTypeFace {
    font: Font<'static>,
}

impl RustTypeFace {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = Font::try_from_vec(data).ok_or_else(|| OverlayError::font("unparseable font data"))?;
        Ok(Self { font })
    }

    #[instrument]
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let face = Self::from_bytes(data)?;
        info!("Loaded font face {} ({} glyphs)", path.display(), face.font.glyph_count());
        Ok(face)
    }

    fn glyph(&self, ch: char) -> rusttype::Glyph<'static> {
        let glyph = self.font.glyph(ch);
        if glyph.id().0 == 0 {
            self.font.glyph('?')
        } else {
            glyph
        }
    }
}

impl GlyphRasterizer for RustTypeFace {
    fn line_metrics(&self, px: f32) -> LineMetrics {
        let v = self.font.v_metrics(Scale::uniform(px));
        LineMetrics {
            ascent: v.ascent.ceil() as i32,
            line_height: (v.ascent - v.descent + v.line_gap).ceil().max(1.0) as u32,
        }
    }

    fn advance(&self, ch: char, px: f32) -> u32 {
        let advance = self.glyph(ch).scaled(Scale::uniform(px)).h_metrics().advance_width;
        advance.round().max(0.0) as u32
    }

    fn draw(&self, ch: char, px: f32, x: i32, baseline: i32, plot: &mut dyn FnMut(i32, i32, u8)) {
        let glyph = self
            .glyph(ch)
            .scaled(Scale::uniform(px))
            .positioned(point(x as f32, baseline as f32));
        let Some(bb) = glyph.pixel_bounding_box() else {
            return;
        };
        glyph.draw(|gx, gy, v| {
            let coverage = (v * 255.0).round().clamp(0.0, 255.0) as u8;
            plot(bb.min.x + gx as i32, bb.min.y + gy as i32, coverage);
        });
    }
}

#[inline]
pub fn pixel_size(scale: u32) -> f32 {
    scale as f32 * BASE_FONT_PX
}

pub fn measure(face: &dyn GlyphRasterizer, guard: &FontGuard, text: &str, scale: u32) -> TextSize {
    if text.is_empty() {
        return TextSize::default();
    }
    let _held = guard.ensure_locked();
    let px = pixel_size(scale);
    let metrics = face.line_metrics(px);
    let mut size = TextSize::default();
    for line in text.split('\n') {
        let width: u32 = line.chars().map(|ch| face.advance(ch, px)).sum();
        size.w = size.w.max(width);
        size.h += metrics.line_height;
    }
    size
}

/// Blends glyph coverage at the foreground color; uncovered pixels are not touched.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    face: &dyn GlyphRasterizer,
    guard: &FontGuard,
    dst: &mut Nv12FrameMut,
    x: u32,
    y: u32,
    text: &str,
    scale: u32,
    fg: Yuv,
) {
    let _held = guard.ensure_locked();
    let px = pixel_size(scale);
    let metrics = face.line_metrics(px);
    let mut plot = |gx: i32, gy: i32, coverage: u8| {
        if gx >= 0 && gy >= 0 {
            blend_pixel(dst, gx as usize, gy as usize, fg, coverage);
        }
    };

    let mut line_top = y as i32;
    for line in text.split('\n') {
        let mut pen_x = x as i32;
        let baseline = line_top + metrics.ascent;
        for ch in line.chars() {
            face.draw(ch, px, pen_x, baseline, &mut plot);
            pen_x += face.advance(ch, px) as i32;
        }
        line_top += metrics.line_height as i32;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Monospace block font: every glyph is a box one pixel narrower than its
    /// advance, solid except for a half-covered right column.
    pub struct BlockFace;

    impl GlyphRasterizer for BlockFace {
        fn line_metrics(&self, px: f32) -> LineMetrics {
            LineMetrics {
                ascent: px as i32,
                line_height: px as u32 + 2,
            }
        }

        fn advance(&self, ch: char, px: f32) -> u32 {
            if ch == ' ' {
                px as u32 / 2
            } else {
                px as u32
            }
        }

        fn draw(&self, ch: char, px: f32, x: i32, baseline: i32, plot: &mut dyn FnMut(i32, i32, u8)) {
            if ch == ' ' {
                return;
            }
            let size = px as i32;
            for gy in 0..size {
                for gx in 0..size - 1 {
                    let coverage = if gx == size - 2 { 128 } else { 255 };
                    plot(x + gx, baseline - size + gy, coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::BlockFace;
    use super::*;
    use crate::frame::Nv12Buffer;
    use crate::text::{TextPath, TextStyle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn measure_sums_advances_per_line() {
        let guard = FontGuard::lock();
        // scale 2 -> 16 px: "ab" = 32, "a b" = 16 + 8 + 16 = 40, line height 18.
        assert_eq!(measure(&BlockFace, &guard, "ab\na b", 2), TextSize { w: 40, h: 36 });
        assert_eq!(measure(&BlockFace, &guard, "", 2), TextSize::default());
    }

    #[test]
    fn draw_blends_by_coverage_and_skips_empty_pixels() {
        let mut buf = Nv12Buffer::new(32, 16);
        buf.view_mut().y_mut().fill(&[100]);
        buf.view_mut().uv_mut().fill(&[128]);
        let guard = FontGuard::lock();
        draw_text(&BlockFace, &guard, &mut buf.view_mut(), 0, 0, "a", 1, Yuv::new(200, 128, 128));

        let view = buf.view();
        let row = view.y().row(0).unwrap();
        // 8 px glyph: 6 solid columns, one half-covered column, one untouched.
        assert_eq!(row[0], crate::compose::blend::mix(200, 100, 255));
        assert_eq!(row[6], crate::compose::blend::mix(200, 100, 128));
        assert_eq!(row[7], 100);
        assert_eq!(view.y().row(8).unwrap()[0], 100);
    }

    /// Counts rasterizer calls made while `FONT_LOCK` was free.
    #[derive(Default)]
    struct LockCheckFace {
        unlocked_calls: AtomicUsize,
    }

    impl LockCheckFace {
        fn check(&self) {
            if FONT_LOCK.try_lock().is_ok() {
                self.unlocked_calls.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    impl GlyphRasterizer for LockCheckFace {
        fn line_metrics(&self, px: f32) -> LineMetrics {
            self.check();
            BlockFace.line_metrics(px)
        }

        fn advance(&self, ch: char, px: f32) -> u32 {
            self.check();
            BlockFace.advance(ch, px)
        }

        fn draw(&self, ch: char, px: f32, x: i32, baseline: i32, plot: &mut dyn FnMut(i32, i32, u8)) {
            self.check();
            BlockFace.draw(ch, px, x, baseline, plot)
        }
    }

    #[test]
    fn rasterizer_always_runs_under_font_lock() {
        let face = Arc::new(LockCheckFace::default());
        let path = TextPath::Vector(face.clone());
        let mut buf = Nv12Buffer::new(32, 16);
        let style = TextStyle {
            fg: Yuv::new(235, 128, 128),
            box_color: None,
            padding: None,
        };

        // A bitmap guard never holds the lock.
        let guard = TextPath::Bitmap.guard();
        assert!(!guard.is_locked());
        assert_eq!(path.measure(&guard, "AB", 1), TextSize { w: 16, h: 10 });
        path.draw(&guard, &mut buf.view_mut(), 0, 0, "AB", 1, &style);
        drop(guard);

        let guard = path.guard();
        path.draw(&guard, &mut buf.view_mut(), 0, 0, "AB", 1, &style);
        drop(guard);

        assert_eq!(face.unlocked_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn guard_reports_lock_state() {
        assert!(!FontGuard::unlocked().is_locked());
        assert!(FontGuard::lock().is_locked());
    }

    #[test]
    fn rejects_garbage_font_bytes() {
        assert!(RustTypeFace::from_bytes(vec![0u8; 64]).is_err());
    }
}
