use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::utils::CachePadded;
use metrics::{counter, histogram};
use tracing::{debug, instrument, warn};

use super::RawFrameCache;
use crate::compose::{copy_frame, scale_frame, Rect};
use crate::compositor::{Compositor, TextOverlay};
use crate::frame::{Nv12Frame, Nv12FrameMut};

/// What happened to a frame in [`FrameProcessor::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRoute {
    /// Replaced by the blocking screen.
    Blocked,
    /// Copied (or scaled) from the source.
    Passthrough,
}

/// Encoder-side hook run once per captured frame.
///
/// Every part is optional; a missing subsystem is skipped.
#[derive(Default)]
pub struct FrameProcessor {
    compositor: Option<Compositor>,
    overlay: Option<TextOverlay>,
    raw_cache: Option<Arc<RawFrameCache>>,
    frames: CachePadded<AtomicU64>,
}

impl FrameProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = Some(compositor);
        self
    }

    pub fn with_overlay(mut self, overlay: TextOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_raw_cache(mut self, cache: Arc<RawFrameCache>) -> Self {
        self.raw_cache = Some(cache);
        self
    }

    pub fn raw_cache(&self) -> Option<&Arc<RawFrameCache>> {
        self.raw_cache.as_ref()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Produces the encoder input in `dst` from the captured `src`.
    #[instrument(level = "trace", skip_all)]
    pub fn process(&self, src: &Nv12Frame, dst: &mut Nv12FrameMut) -> FrameRoute {
        let start = Instant::now();

        if let Some(cache) = &self.raw_cache {
            if let Err(e) = cache.store(src) {
                warn!("Raw frame not cached: {}", e);
            }
        }

        self.note_config_changes();

        let route = match &self.compositor {
            Some(compositor) if compositor.store().is_enabled_fast() => {
                compositor.composite(src, dst);
                FrameRoute::Blocked
            }
            _ => {
                if src.same_size(dst.width(), dst.height()) {
                    copy_frame(src, dst);
                } else {
                    scale_frame(src, dst, Rect::new(0, 0, dst.width(), dst.height()));
                }
                FrameRoute::Passthrough
            }
        };

        if let Some(overlay) = &self.overlay {
            if overlay.store().is_enabled_fast() {
                overlay.draw(dst);
            }
        }

        self.frames.fetch_add(1, Ordering::Relaxed);
        histogram!("composite_time_us").record(start.elapsed().as_micros() as f64);
        route
    }

    fn note_config_changes(&self) {
        if let Some(compositor) = &self.compositor {
            if compositor.store().take_dirty() {
                counter!("overlay_config_updates", "subsystem" => "blocking").increment(1);
                debug!("Blocking config changed");
            }
        }
        if let Some(overlay) = &self.overlay {
            if overlay.store().take_dirty() {
                counter!("overlay_config_updates", "subsystem" => "text").increment(1);
                debug!("Text overlay config changed");
            }
        }
    }
}
