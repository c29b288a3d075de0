use std::path::Path;

use apollo_compositor::compose::blend::mix;
use apollo_compositor::text::vector::{self, pixel_size, FontGuard, GlyphRasterizer, RustTypeFace};
use apollo_compositor::{Nv12Buffer, TextPath, Yuv};
use rusttype::{Font, Scale};

const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/DejaVuSansMono.ttf");

fn face() -> RustTypeFace {
    RustTypeFace::from_file(Path::new(FONT)).unwrap()
}

fn plots(face: &RustTypeFace, ch: char, px: f32, x: i32, baseline: i32) -> Vec<(i32, i32, u8)> {
    let mut out = Vec::new();
    face.draw(ch, px, x, baseline, &mut |gx, gy, coverage| out.push((gx, gy, coverage)));
    out
}

#[test_log::test]
fn loads_as_vector_path() {
    assert!(TextPath::load(Some(Path::new(FONT))).is_vector());
}

#[test]
fn line_height_comes_from_vertical_metrics() {
    let font = Font::try_from_vec(std::fs::read(FONT).unwrap()).unwrap();
    let _guard = FontGuard::lock();
    for scale in [1, 2, 5] {
        let px = pixel_size(scale);
        let v = font.v_metrics(Scale::uniform(px));
        let metrics = face().line_metrics(px);
        assert_eq!(metrics.ascent, v.ascent.ceil() as i32);
        assert_eq!(metrics.line_height, (v.ascent - v.descent + v.line_gap).ceil() as u32);
    }
}

#[test]
fn unmapped_codepoint_renders_as_question_mark() {
    let face = face();
    let guard = FontGuard::lock();
    let unmapped = '\u{10FFFD}';

    assert_eq!(face.advance(unmapped, 16.0), face.advance('?', 16.0));
    assert_eq!(
        vector::measure(&face, &guard, "a\u{10FFFD}b", 2),
        vector::measure(&face, &guard, "a?b", 2)
    );
    let question = plots(&face, '?', 16.0, 0, 20);
    assert!(!question.is_empty());
    assert_eq!(plots(&face, unmapped, 16.0, 0, 20), question);
    assert_ne!(plots(&face, 'A', 16.0, 0, 20), question);
}

#[test]
fn measure_sums_monospace_advances() {
    let face = face();
    let guard = FontGuard::lock();
    let advance = face.advance('A', 16.0);
    assert!(advance > 0);
    let size = vector::measure(&face, &guard, "AB\nABCD", 2);
    assert_eq!(size.w, 4 * advance);
    assert_eq!(size.h, 2 * face.line_metrics(16.0).line_height);
}

#[test]
fn coverage_blends_and_zero_coverage_is_skipped() {
    let face = face();
    let guard = FontGuard::lock();
    let (bg, fg) = (16u8, Yuv::new(235, 128, 128));
    let mut buf = Nv12Buffer::new(32, 32);
    buf.view_mut().y_mut().fill(&[bg]);
    buf.view_mut().uv_mut().fill(&[128]);

    let (x, y) = (4, 4);
    vector::draw_text(&face, &guard, &mut buf.view_mut(), x, y, "H", 2, fg);

    let baseline = y as i32 + face.line_metrics(16.0).ascent;
    let expected = plots(&face, 'H', 16.0, x as i32, baseline);
    let zero = expected.iter().filter(|&&(_, _, c)| c == 0).count();
    assert!(zero > 0, "the gap between the stems has no coverage");

    let view = buf.view();
    let luma = view.y();
    let mut changed = 0;
    for &(gx, gy, coverage) in &expected {
        let px = luma.row(gy as usize).unwrap()[gx as usize];
        let want = if coverage == 0 { bg } else { mix(fg.y, bg, coverage) };
        assert_eq!(px, want, "pixel ({gx}, {gy}) with coverage {coverage}");
        if want != bg {
            changed += 1;
        }
    }
    assert!(changed > 0);
    // Nothing outside the glyph box was touched.
    let touched = luma.as_bytes().iter().filter(|&&px| px != bg).count();
    assert_eq!(touched, changed);
}
