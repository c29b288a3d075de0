//! 1-bit 8x8 fallback font
//!
//! Always available. Glyphs come from the public-domain font8x8 basic table
//! where bit 0 of each row byte is the leftmost pixel.

use font8x8::legacy::BASIC_LEGACY;

use super::TextSize;
use crate::color::Yuv;
use crate::compose::put_pixel;
use crate::frame::Nv12FrameMut;

pub const CELL: u32 = 8;

#[inline]
fn glyph(ch: char) -> &'static [u8; 8] {
    let index = if ch.is_ascii() { ch as usize } else { '?' as usize };
    &BASIC_LEGACY[index]
}

/// Size of `text` drawn with `scale`x`scale` pixels per font pixel.
pub fn measure(text: &str, scale: u32) -> TextSize {
    if text.is_empty() {
        return TextSize::default();
    }
    let (columns, lines) = text
        .split('\n')
        .fold((0usize, 0u32), |(columns, lines), line| {
            (columns.max(line.chars().count()), lines + 1)
        });
    TextSize {
        w: columns as u32 * CELL * scale,
        h: lines * CELL * scale,
    }
}

/// Opaque blit of one glyph with its top-left corner at `(x, y)`.
pub fn draw_glyph(dst: &mut Nv12FrameMut, x: u32, y: u32, ch: char, scale: u32, fg: Yuv) {
    let (x, y, scale) = (x as usize, y as usize, scale as usize);
    for (cy, bits) in glyph(ch).iter().enumerate() {
        for cx in 0..CELL as usize {
            if (bits >> cx) & 1 == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    put_pixel(dst, x + cx * scale + sx, y + cy * scale + sy, fg);
                }
            }
        }
    }
}

pub fn draw_text(dst: &mut Nv12FrameMut, x: u32, y: u32, text: &str, scale: u32, fg: Yuv) {
    let advance = CELL * scale;
    let mut pen_y = y;
    for line in text.split('\n') {
        let mut pen_x = x;
        for ch in line.chars() {
            draw_glyph(dst, pen_x, pen_y, ch, scale, fg);
            pen_x = pen_x.saturating_add(advance);
        }
        pen_y = pen_y.saturating_add(advance);
    }
}
