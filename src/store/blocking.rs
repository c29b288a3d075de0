//! Configuration for the "blocking" subsystem
//!
//! Replaces the live picture with a still background, an optional scaled
//! preview of the live source, and two text captions.

use std::ops::RangeInclusive;
use std::sync::Mutex;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{lock_recover, FastFlag, FixedText};
use crate::codec::{default_codec, JpegCodec};
use crate::color::{rgb24_to_nv12, Yuv, YuvA};
use crate::error::{OverlayError, Result};
use crate::frame::{nv12_len, Nv12Buffer, Nv12Frame};
use crate::BlockingSettings;

/// Largest accepted background, 3840x2160 in NV12.
pub const MAX_BG_BYTES: usize = 3840 * 2160 * 3 / 2;

pub const HEADLINE_CAPACITY: usize = 1024;
pub const STATS_CAPACITY: usize = 512;

pub const HEADLINE_SCALE: RangeInclusive<u32> = 1..=15;
pub const STATS_SCALE: RangeInclusive<u32> = 1..=10;

pub const DEFAULT_HEADLINE_SCALE: u32 = 10;
pub const DEFAULT_STATS_SCALE: u32 = 4;
pub const DEFAULT_TEXT_COLOR: Yuv = Yuv::new(235, 128, 128);
pub const DEFAULT_BOX_COLOR: YuvA = YuvA::new(16, 128, 128, 180);

/// Live-source window. Negative `x`/`y` are measured from the far edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub enabled: bool,
}

/// Value snapshot of the store. The background pixels stay behind the lock;
/// only their metadata is copied out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingConfig {
    pub enabled: bool,
    pub bg_width: u32,
    pub bg_height: u32,
    pub bg_valid: bool,
    pub preview: PreviewConfig,
    pub headline: FixedText<HEADLINE_CAPACITY>,
    pub stats: FixedText<STATS_CAPACITY>,
    pub headline_scale: u32,
    pub stats_scale: u32,
    pub text_color: Yuv,
    pub box_color: YuvA,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bg_width: 0,
            bg_height: 0,
            bg_valid: false,
            preview: PreviewConfig::default(),
            headline: FixedText::new(),
            stats: FixedText::new(),
            headline_scale: DEFAULT_HEADLINE_SCALE,
            stats_scale: DEFAULT_STATS_SCALE,
            text_color: DEFAULT_TEXT_COLOR,
            box_color: DEFAULT_BOX_COLOR,
        }
    }
}

struct Inner {
    config: BlockingConfig,
    background: Nv12Buffer,
    dirty: bool,
}

pub struct BlockingStore {
    inner: Mutex<Inner>,
    fast: FastFlag,
}

impl std::fmt::Debug for BlockingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingStore")
            .field("enabled", &self.fast.get())
            .finish_non_exhaustive()
    }
}

impl Default for BlockingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingStore {
    /// Allocates the background buffer once, sized for the largest accepted image.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                config: BlockingConfig::default(),
                background: Nv12Buffer::with_capacity_bytes(MAX_BG_BYTES),
                dirty: false,
            }),
            fast: FastFlag::default(),
        }
    }

    pub fn with_settings(settings: &BlockingSettings) -> Self {
        let store = Self::new();
        {
            let mut inner = lock_recover(&store.inner);
            let config = &mut inner.config;
            config.headline_scale = clamp_scale(settings.headline_scale, HEADLINE_SCALE);
            config.stats_scale = clamp_scale(settings.stats_scale, STATS_SCALE);
            config.text_color = settings.text_color;
            config.box_color = settings.box_color;
        }
        store
    }

    fn update(&self, f: impl FnOnce(&mut BlockingConfig)) {
        let mut inner = lock_recover(&self.inner);
        f(&mut inner.config);
        inner.dirty = true;
    }

    pub fn enable(&self, enabled: bool) {
        // Published under the lock so the flag cannot disagree with the config.
        self.update(|config| {
            config.enabled = enabled;
            self.fast.publish(enabled);
        });
        info!("Blocking overlay {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        lock_recover(&self.inner).config.enabled
    }

    /// Lock-free check for the encoder hot path.
    #[inline]
    pub fn is_enabled_fast(&self) -> bool {
        self.fast.get()
    }

    /// Decodes with [`default_codec`].
    pub fn set_background_jpeg(&self, data: &[u8]) -> Result<()> {
        self.set_background_jpeg_with(default_codec(), data)
    }

    /// Replaces the background. On any failure the previous background is kept.
    #[instrument(skip(self, codec, data), fields(len = data.len()))]
    pub fn set_background_jpeg_with(&self, codec: &dyn JpegCodec, data: &[u8]) -> Result<()> {
        match self.ingest(codec, data) {
            Ok((width, height)) => {
                info!("Background set to {}x{}", width, height);
                Ok(())
            }
            Err(e) => {
                counter!("background_rejected").increment(1);
                error!("Background rejected: {}", e);
                Err(e)
            }
        }
    }

    fn ingest(&self, codec: &dyn JpegCodec, data: &[u8]) -> Result<(u32, u32)> {
        if data.is_empty() {
            return Err(OverlayError::EmptyInput);
        }

        let (width, height) = codec.probe(data)?;
        if width == 0 || height == 0 {
            return Err(OverlayError::decode(format!("degenerate image {width}x{height}")));
        }
        let bytes = nv12_len(width, height);
        if bytes > MAX_BG_BYTES {
            return Err(OverlayError::TooLarge {
                width,
                height,
                bytes,
                max: MAX_BG_BYTES,
            });
        }

        // Decoding is the slow part and touches no shared state.
        let image = codec.decode(data)?;
        if (image.width, image.height) != (width, height) {
            return Err(OverlayError::decode(format!(
                "header said {}x{}, decoder produced {}x{}",
                width, height, image.width, image.height
            )));
        }
        if image.data.len() < width as usize * height as usize * 3 {
            return Err(OverlayError::decode("short scanline data"));
        }

        let mut inner = lock_recover(&self.inner);
        let Inner {
            config,
            background,
            dirty,
        } = &mut *inner;
        background.reshape(width, height)?;
        rgb24_to_nv12(&image.data, width, height, &mut background.view_mut())?;
        config.bg_width = width;
        config.bg_height = height;
        config.bg_valid = true;
        *dirty = true;
        Ok((width, height))
    }

    pub fn set_preview(&self, x: i32, y: i32, w: u32, h: u32, enabled: bool) {
        self.update(|config| {
            config.preview = PreviewConfig { x, y, w, h, enabled };
        });
        debug!("Preview {}x{} at ({}, {}) enabled={}", w, h, x, y, enabled);
    }

    pub fn set_headline(&self, text: &str) {
        let mut truncated = false;
        self.update(|config| truncated = config.headline.set(text));
        debug!(truncated, "Headline set ({} bytes)", text.len());
    }

    pub fn set_stats(&self, text: &str) {
        let mut truncated = false;
        self.update(|config| truncated = config.stats.set(text));
        debug!(truncated, "Stats set ({} bytes)", text.len());
    }

    pub fn set_headline_scale(&self, scale: u32) {
        self.update(|config| config.headline_scale = clamp_scale(scale, HEADLINE_SCALE));
    }

    pub fn set_stats_scale(&self, scale: u32) {
        self.update(|config| config.stats_scale = clamp_scale(scale, STATS_SCALE));
    }

    pub fn set_text_color(&self, y: u8, u: u8, v: u8) {
        self.update(|config| config.text_color = Yuv::new(y, u, v));
    }

    pub fn set_box_color(&self, y: u8, u: u8, v: u8, alpha: u8) {
        self.update(|config| config.box_color = YuvA::new(y, u, v, alpha));
    }

    /// Disables the subsystem, invalidates the background (keeping its
    /// allocation) and empties both captions.
    pub fn clear(&self) {
        self.update(|config| {
            self.fast.publish(false);
            config.enabled = false;
            config.bg_valid = false;
            config.preview.enabled = false;
            config.headline.clear();
            config.stats.clear();
        });
        info!("Blocking overlay cleared");
    }

    pub fn get_config(&self) -> BlockingConfig {
        lock_recover(&self.inner).config
    }

    /// Returns whether anything changed since the last call, and resets it.
    pub fn take_dirty(&self) -> bool {
        std::mem::take(&mut lock_recover(&self.inner).dirty)
    }

    /// Runs `f` under the store lock with the config and, when valid, the background.
    pub(crate) fn with_locked<R>(
        &self,
        f: impl FnOnce(&BlockingConfig, Option<Nv12Frame<'_>>) -> R,
    ) -> R {
        let inner = lock_recover(&self.inner);
        let background = inner.config.bg_valid.then(|| inner.background.view());
        f(&inner.config, background)
    }
}

#[inline]
fn clamp_scale(scale: u32, range: RangeInclusive<u32>) -> u32 {
    scale.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{BrokenCodec, SolidCodec};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> SolidCodec {
        SolidCodec { width, height, rgb }
    }

    fn background_bytes(store: &BlockingStore) -> Option<Vec<u8>> {
        store.with_locked(|_, bg| bg.map(|frame| {
            let mut out = frame.y().as_bytes().to_vec();
            out.extend_from_slice(frame.uv().as_bytes());
            out
        }))
    }

    #[test]
    fn defaults() {
        let config = BlockingStore::new().get_config();
        assert!(!config.enabled);
        assert!(!config.bg_valid);
        assert_eq!(config.headline_scale, 10);
        assert_eq!(config.stats_scale, 4);
        assert_eq!(config.text_color, Yuv::new(235, 128, 128));
        assert_eq!(config.box_color, YuvA::new(16, 128, 128, 180));
    }

    #[test]
    fn fast_flag_follows_enable_and_clear() {
        let store = BlockingStore::new();
        store.enable(true);
        assert!(store.is_enabled_fast());
        assert!(store.is_enabled());
        store.clear();
        assert!(!store.is_enabled_fast());
        assert!(!store.is_enabled());
    }

    #[test]
    fn scales_are_clamped_on_write() {
        let store = BlockingStore::new();
        store.set_headline_scale(0);
        store.set_stats_scale(99);
        let config = store.get_config();
        assert_eq!(config.headline_scale, 1);
        assert_eq!(config.stats_scale, 10);
        store.set_headline_scale(40);
        assert_eq!(store.get_config().headline_scale, 15);
    }

    #[test]
    fn text_is_truncated_to_capacity() {
        let store = BlockingStore::new();
        store.set_headline(&"h".repeat(5000));
        store.set_stats(&"s".repeat(600));
        let config = store.get_config();
        assert_eq!(config.headline.len(), HEADLINE_CAPACITY - 1);
        assert_eq!(config.stats.len(), STATS_CAPACITY - 1);
    }

    #[test]
    fn background_is_converted_and_exposed_only_when_valid() {
        let store = BlockingStore::new();
        assert!(background_bytes(&store).is_none());

        store
            .set_background_jpeg_with(&solid(4, 2, [255, 255, 255]), b"jpeg")
            .unwrap();
        let config = store.get_config();
        assert!(config.bg_valid);
        assert_eq!((config.bg_width, config.bg_height), (4, 2));
        assert_eq!(background_bytes(&store).unwrap(), vec![235, 235, 235, 235, 235, 235, 235, 235, 128, 128, 128, 128]);
    }

    #[test]
    fn oversized_background_keeps_previous() {
        let store = BlockingStore::new();
        store
            .set_background_jpeg_with(&solid(2, 2, [0, 0, 0]), b"jpeg")
            .unwrap();
        let before = background_bytes(&store);
        store.take_dirty();

        let err = store
            .set_background_jpeg_with(&solid(3841, 2160, [255, 0, 0]), b"jpeg")
            .unwrap_err();
        assert!(matches!(err, OverlayError::TooLarge { .. }));
        assert_eq!(background_bytes(&store), before);
        assert_eq!(store.get_config().bg_width, 2);
        assert!(!store.take_dirty());
    }

    #[test]
    fn largest_background_is_accepted() {
        let store = BlockingStore::new();
        store
            .set_background_jpeg_with(&solid(3840, 2160, [16, 16, 16]), b"jpeg")
            .unwrap();
        assert_eq!(store.get_config().bg_width, 3840);
    }

    #[test]
    fn empty_and_undecodable_input_fail() {
        let store = BlockingStore::new();
        assert!(matches!(
            store.set_background_jpeg_with(&solid(2, 2, [0; 3]), b""),
            Err(OverlayError::EmptyInput)
        ));
        assert!(matches!(
            store.set_background_jpeg_with(&BrokenCodec, b"jpeg"),
            Err(OverlayError::Decode(_))
        ));
        assert!(!store.get_config().bg_valid);
    }

    #[test]
    fn clear_keeps_allocation_but_invalidates() {
        let store = BlockingStore::new();
        store
            .set_background_jpeg_with(&solid(2, 2, [0, 0, 0]), b"jpeg")
            .unwrap();
        store.set_headline("hello");
        store.set_stats("world");
        store.set_preview(0, 0, 320, 180, true);
        store.clear();

        let config = store.get_config();
        assert!(!config.bg_valid);
        assert!(!config.preview.enabled);
        assert!(config.headline.is_empty());
        assert!(config.stats.is_empty());
        assert!(background_bytes(&store).is_none());
        assert_eq!(lock_recover(&store.inner).background.capacity(), MAX_BG_BYTES);
    }

    #[test]
    fn setters_mark_dirty() {
        let store = BlockingStore::new();
        assert!(!store.take_dirty());
        store.set_text_color(1, 2, 3);
        assert!(store.take_dirty());
        assert!(!store.take_dirty());
        store.set_box_color(4, 5, 6, 7);
        assert!(store.take_dirty());
        assert_eq!(store.get_config().box_color, YuvA::new(4, 5, 6, 7));
    }

    #[test]
    fn settings_are_clamped() {
        let settings = BlockingSettings {
            headline_scale: 100,
            stats_scale: 0,
            ..Default::default()
        };
        let config = BlockingStore::with_settings(&settings).get_config();
        assert_eq!(config.headline_scale, 15);
        assert_eq!(config.stats_scale, 1);
    }

    #[test]
    fn fast_flag_follows_config_under_racing_enable_and_clear() {
        let store = BlockingStore::new();
        for _ in 0..500 {
            std::thread::scope(|scope| {
                scope.spawn(|| store.enable(true));
                scope.spawn(|| store.clear());
            });
            assert_eq!(store.is_enabled(), store.is_enabled_fast());
        }
    }
}
