//! Text measurement and rendering
//!
//! Each text slot renders through a vector face when one loaded at startup,
//! and through the built-in 8x8 bitmap font otherwise.

pub mod bitmap;
pub mod vector;

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::color::{Yuv, YuvA};
use crate::compose::{blend_rect, Rect};
use crate::frame::Nv12FrameMut;

pub use vector::{FontGuard, GlyphRasterizer, LineMetrics, RustTypeFace, BASE_FONT_PX, FONT_LOCK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextSize {
    pub w: u32,
    pub h: u32,
}

impl TextSize {
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub fg: Yuv,
    /// Blended box behind the text, `None` for bare glyphs.
    pub box_color: Option<YuvA>,
    /// Box margin around the text; `None` picks the path default.
    pub padding: Option<u32>,
}

#[derive(Clone, Default)]
pub enum TextPath {
    #[default]
    Bitmap,
    Vector(Arc<dyn GlyphRasterizer>),
}

impl std::fmt::Debug for TextPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitmap => f.write_str("Bitmap"),
            Self::Vector(_) => f.write_str("Vector"),
        }
    }
}

impl TextPath {
    /// Loads a vector face, falling back to the bitmap font on any failure.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::Bitmap;
        };
        match RustTypeFace::from_file(path) {
            Ok(face) => Self::Vector(Arc::new(face)),
            Err(e) => {
                warn!("Font {} unavailable, using bitmap font: {}", path.display(), e);
                Self::Bitmap
            }
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    /// Font lock for this path alone; the bitmap path never needs it.
    pub fn guard(&self) -> FontGuard {
        if self.is_vector() {
            FontGuard::lock()
        } else {
            FontGuard::unlocked()
        }
    }

    pub fn measure(&self, guard: &FontGuard, text: &str, scale: u32) -> TextSize {
        match self {
            Self::Bitmap => bitmap::measure(text, scale),
            Self::Vector(face) => vector::measure(face.as_ref(), guard, text, scale),
        }
    }

    pub fn default_padding(&self, scale: u32) -> u32 {
        match self {
            Self::Bitmap => 8,
            Self::Vector(_) => (vector::pixel_size(scale) / 2.0) as u32,
        }
    }

    /// Draws the optional box, then the glyphs with their top-left at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        guard: &FontGuard,
        dst: &mut Nv12FrameMut,
        x: u32,
        y: u32,
        text: &str,
        scale: u32,
        style: &TextStyle,
    ) -> TextSize {
        if text.is_empty() {
            return TextSize::default();
        }
        let size = self.measure(guard, text, scale);

        if let Some(box_color) = style.box_color {
            if !size.is_empty() {
                let pad = style.padding.unwrap_or_else(|| self.default_padding(scale));
                let rect = Rect::new(
                    x.saturating_sub(pad),
                    y.saturating_sub(pad),
                    size.w + 2 * pad,
                    size.h + 2 * pad,
                );
                blend_rect(dst, rect, box_color);
            }
        }

        match self {
            Self::Bitmap => bitmap::draw_text(dst, x, y, text, scale, style.fg),
            Self::Vector(face) => {
                vector::draw_text(face.as_ref(), guard, dst, x, y, text, scale, style.fg)
            }
        }
        size
    }
}

/// Text paths for the two blocking-screen slots.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    pub headline: TextPath,
    pub stats: TextPath,
}

impl FontSet {
    pub fn load(headline: Option<&Path>, stats: Option<&Path>) -> Self {
        Self {
            headline: TextPath::load(headline),
            stats: TextPath::load(stats),
        }
    }

    pub fn uses_vector(&self) -> bool {
        self.headline.is_vector() || self.stats.is_vector()
    }

    /// Takes the font lock for the whole text pass when any slot needs it.
    pub fn guard(&self) -> FontGuard {
        if self.uses_vector() {
            FontGuard::lock()
        } else {
            FontGuard::unlocked()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::vector::testing::BlockFace;
    use super::*;
    use crate::frame::Nv12Buffer;

    const WHITE: Yuv = Yuv::new(235, 128, 128);

    #[test]
    fn missing_font_falls_back_to_bitmap() {
        let path = TextPath::load(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!path.is_vector());
        assert!(!TextPath::load(None).is_vector());
    }

    #[test]
    fn default_padding_per_path() {
        assert_eq!(TextPath::Bitmap.default_padding(10), 8);
        let vector = TextPath::Vector(Arc::new(BlockFace));
        assert_eq!(vector.default_padding(4), 16);
    }

    #[test]
    fn bitmap_guard_is_not_locked() {
        assert!(!FontSet::default().guard().is_locked());
        let set = FontSet {
            headline: TextPath::Bitmap,
            stats: TextPath::Vector(Arc::new(BlockFace)),
        };
        assert!(set.guard().is_locked());
    }

    #[test]
    fn box_is_padded_around_text() {
        let mut buf = Nv12Buffer::new(64, 32);
        buf.view_mut().y_mut().fill(&[200]);
        buf.view_mut().uv_mut().fill(&[128]);
        let style = TextStyle {
            fg: WHITE,
            box_color: Some(YuvA::new(16, 128, 128, 128)),
            padding: None,
        };
        let size = TextPath::Bitmap.draw(
            &FontGuard::unlocked(),
            &mut buf.view_mut(),
            10,
            10,
            " ",
            1,
            &style,
        );
        assert_eq!(size, TextSize { w: 8, h: 8 });

        let view = buf.view();
        let shaded = crate::compose::blend::mix(16, 200, 128);
        // Box spans x 2..26, y 2..26.
        let row = view.y().row(2).unwrap();
        assert_eq!(row[1], 200);
        assert_eq!(row[2], shaded);
        assert_eq!(row[25], shaded);
        assert_eq!(row[26], 200);
        assert_eq!(view.y().row(26).unwrap()[10], 200);
    }

    #[test]
    fn box_clamps_at_origin() {
        let mut buf = Nv12Buffer::new(32, 32);
        buf.view_mut().y_mut().fill(&[200]);
        let style = TextStyle {
            fg: WHITE,
            box_color: Some(YuvA::new(0, 128, 128, 128)),
            padding: Some(8),
        };
        TextPath::Bitmap.draw(&FontGuard::unlocked(), &mut buf.view_mut(), 4, 4, " ", 1, &style);
        // Origin clamps to 0 while the size stays text + 2 * padding.
        let row = buf.view().y().row(0).unwrap().to_vec();
        assert_eq!(row[0], 100);
        assert_eq!(row[23], 100);
        assert_eq!(row[24], 200);
    }

    #[test]
    fn vector_path_uses_face_metrics() {
        let path = TextPath::Vector(Arc::new(BlockFace));
        let guard = FontGuard::lock();
        assert_eq!(path.measure(&guard, "HELLO", 1), TextSize { w: 40, h: 10 });
    }
}
