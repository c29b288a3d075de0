//! Per-frame overlay drawing
//!
//! [`Compositor`] renders the blocking screen: background, live preview
//! window, headline and stats captions. [`TextOverlay`] draws the simple
//! caption on top of a frame. Both read one configuration snapshot per call
//! and never fail; anything outside the destination is clipped.

use std::sync::Arc;

use tracing::{instrument, trace};

use crate::compose::{copy_frame, fill_frame, scale_frame, Rect, NEUTRAL_FILL};
use crate::frame::{Nv12Frame, Nv12FrameMut};
use crate::store::{BlockingConfig, BlockingStore, PreviewConfig, TextOverlayStore};
use crate::text::{FontSet, TextPath, TextStyle};

/// Luma of the preview window border.
pub const BORDER_LUMA: u8 = 235;
pub const BORDER_WIDTH: u32 = 2;

/// Smallest window an oversized preview request is shrunk to.
pub const MIN_PREVIEW: (u32, u32) = (160, 90);

const TEXT_INSET: i64 = 10;
const STATS_LEFT: i64 = 20;
const STATS_BOTTOM: i64 = 30;

pub struct Compositor {
    store: Arc<BlockingStore>,
    fonts: FontSet,
}

impl Compositor {
    pub fn new(store: Arc<BlockingStore>, fonts: FontSet) -> Self {
        Self { store, fonts }
    }

    pub fn store(&self) -> &Arc<BlockingStore> {
        &self.store
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Overwrites all of `dst` with the blocking screen, using `src` for the
    /// preview window.
    #[instrument(level = "trace", skip_all, fields(w = dst.width(), h = dst.height()))]
    pub fn composite(&self, src: &Nv12Frame, dst: &mut Nv12FrameMut) {
        let (width, height) = (dst.width(), dst.height());

        // The background is only readable under the store lock.
        let config = self.store.with_locked(|config, background| {
            match background {
                Some(bg) if bg.same_size(width, height) => copy_frame(&bg, dst),
                Some(bg) => scale_frame(&bg, dst, Rect::new(0, 0, width, height)),
                None => fill_frame(dst, NEUTRAL_FILL),
            }
            *config
        });

        if let Some(rect) = resolve_preview_rect(&config.preview, width, height) {
            trace!(?rect, "preview");
            scale_frame(src, dst, rect);
            draw_border(dst, rect);
        }

        self.draw_captions(&config, dst);
    }

    fn draw_captions(&self, config: &BlockingConfig, dst: &mut Nv12FrameMut) {
        if config.headline.is_empty() && config.stats.is_empty() {
            return;
        }
        let (width, height) = (dst.width() as i64, dst.height() as i64);
        let style = TextStyle {
            fg: config.text_color,
            box_color: Some(config.box_color),
            padding: None,
        };
        // One lock for both captions.
        let guard = self.fonts.guard();

        if !config.headline.is_empty() {
            let path = &self.fonts.headline;
            let text = config.headline.as_str();
            let size = path.measure(&guard, text, config.headline_scale);
            let x = ((width - size.w as i64) / 2).max(TEXT_INSET);
            let y = ((height * 6 / 10 - size.h as i64) / 2).max(TEXT_INSET);
            path.draw(&guard, dst, x as u32, y as u32, text, config.headline_scale, &style);
        }

        if !config.stats.is_empty() {
            let path = &self.fonts.stats;
            let text = config.stats.as_str();
            let size = path.measure(&guard, text, config.stats_scale);
            let y = (height - size.h as i64 - STATS_BOTTOM).max(TEXT_INSET);
            path.draw(&guard, dst, STATS_LEFT as u32, y as u32, text, config.stats_scale, &style);
        }
    }
}

/// Where the preview window lands in a `dst_w` x `dst_h` frame, if anywhere.
///
/// A window larger than the frame is shrunk proportionally to a fifth of the
/// size that would fit, but not below [`MIN_PREVIEW`]. Negative coordinates
/// count back from the right/bottom edge. The result lies inside the frame
/// with every coordinate and dimension even.
pub fn resolve_preview_rect(preview: &PreviewConfig, dst_w: u32, dst_h: u32) -> Option<Rect> {
    if !preview.enabled || preview.w == 0 || preview.h == 0 || dst_w == 0 || dst_h == 0 {
        return None;
    }

    let (mut w, mut h) = (preview.w as u64, preview.h as u64);
    if preview.w > dst_w || preview.h > dst_h {
        let ratio = (((dst_w as u64) << 16) / w).min(((dst_h as u64) << 16) / h);
        w = (((w * ratio) >> 16) / 5).max(MIN_PREVIEW.0 as u64);
        h = (((h * ratio) >> 16) / 5).max(MIN_PREVIEW.1 as u64);
    }
    let w = (w.min(dst_w as u64) as u32) & !1;
    let h = (h.min(dst_h as u64) as u32) & !1;
    if w == 0 || h == 0 {
        return None;
    }

    let place = |coord: i32, size: u32, dim: u32| -> u32 {
        let (coord, size, dim) = (coord as i64, size as i64, dim as i64);
        let pos = if coord < 0 { dim + coord - size } else { coord };
        (pos.clamp(0, dim - size) as u32) & !1
    };
    Some(Rect::new(
        place(preview.x, w, dst_w),
        place(preview.y, h, dst_h),
        w,
        h,
    ))
}

/// Opaque luma border, [`BORDER_WIDTH`] pixels thick, just inside `rect`.
fn draw_border(dst: &mut Nv12FrameMut, rect: Rect) {
    let luma = dst.y_mut();
    let (x0, x1) = (rect.x as usize, rect.right() as usize);
    let (y0, y1) = (rect.y as usize, rect.bottom() as usize);
    let thickness = BORDER_WIDTH as usize;

    for y in y0..y1 {
        let Some(row) = luma.row_mut(y) else {
            break;
        };
        let end = x1.min(row.len());
        if y < y0 + thickness || y + thickness >= y1 {
            if let Some(span) = row.get_mut(x0..end) {
                span.fill(BORDER_LUMA);
            }
            continue;
        }
        for x in (x0..x0 + thickness).chain(x1.saturating_sub(thickness)..x1) {
            if let Some(px) = row.get_mut(x) {
                *px = BORDER_LUMA;
            }
        }
    }
}

/// Draws the simple text overlay over an already composed frame.
pub struct TextOverlay {
    store: Arc<TextOverlayStore>,
    path: TextPath,
}

impl TextOverlay {
    pub fn new(store: Arc<TextOverlayStore>, path: TextPath) -> Self {
        Self { store, path }
    }

    pub fn store(&self) -> &Arc<TextOverlayStore> {
        &self.store
    }

    #[instrument(level = "trace", skip_all)]
    pub fn draw(&self, dst: &mut Nv12FrameMut) {
        let config = self.store.get_config();
        if !config.enabled || config.text.is_empty() {
            return;
        }
        let guard = self.path.guard();
        let text = config.text.as_str();
        let size = self.path.measure(&guard, text, config.scale);
        if size.is_empty() {
            return;
        }
        let (x, y) = config.place(dst.width(), dst.height(), size);
        let style = TextStyle {
            fg: config.color,
            box_color: config.background.then_some(config.box_color),
            padding: Some(config.padding),
        };
        self.path.draw(&guard, dst, x, y, text, config.scale, &style);
    }
}
