//! Configuration for the simple text overlay
//!
//! A single caption drawn on top of whatever the encoder is about to send,
//! anchored to a corner, the center, or a custom point.

use std::ops::RangeInclusive;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{lock_recover, FastFlag, FixedText};
use crate::color::{Yuv, YuvA};
use crate::text::TextSize;
use crate::OverlaySettings;

pub const TEXT_CAPACITY: usize = 256;
pub const SCALE: RangeInclusive<u32> = 1..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    /// Uses the configured `x`/`y`.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOverlayConfig {
    pub enabled: bool,
    pub text: FixedText<TEXT_CAPACITY>,
    pub position: OverlayPosition,
    pub x: i32,
    pub y: i32,
    pub scale: u32,
    pub color: Yuv,
    pub background: bool,
    pub box_color: YuvA,
    pub padding: u32,
}

impl Default for TextOverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text: FixedText::new(),
            position: OverlayPosition::TopRight,
            x: 0,
            y: 0,
            scale: 2,
            color: Yuv::new(235, 128, 128),
            background: true,
            box_color: YuvA::new(16, 128, 128, 180),
            padding: 8,
        }
    }
}

impl TextOverlayConfig {
    /// Top-left corner of the text for a frame of `frame_w` x `frame_h`.
    ///
    /// The padded box is kept inside the frame where it fits; otherwise it is
    /// pinned to the top-left edge.
    pub fn place(&self, frame_w: u32, frame_h: u32, text: TextSize) -> (u32, u32) {
        let pad = self.padding as i64;
        let (fw, fh) = (frame_w as i64, frame_h as i64);
        let total_w = text.w as i64 + 2 * pad;
        let total_h = text.h as i64 + 2 * pad;

        let (x, y) = match self.position {
            OverlayPosition::TopLeft => (pad, pad),
            OverlayPosition::TopRight => (fw - total_w, pad),
            OverlayPosition::BottomLeft => (pad, fh - total_h),
            OverlayPosition::BottomRight => (fw - total_w, fh - total_h),
            OverlayPosition::Center => ((fw - total_w) / 2, (fh - total_h) / 2),
            OverlayPosition::Custom => (self.x as i64, self.y as i64),
        };

        let clamp = |v: i64, total: i64, frame: i64| {
            let v = v.max(0);
            let v = if v + total > frame { frame - total } else { v };
            v.max(0) as u32
        };
        (clamp(x, total_w, fw), clamp(y, total_h, fh))
    }
}

struct Inner {
    config: TextOverlayConfig,
    dirty: bool,
}

pub struct TextOverlayStore {
    inner: Mutex<Inner>,
    fast: FastFlag,
}

impl std::fmt::Debug for TextOverlayStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextOverlayStore")
            .field("enabled", &self.fast.get())
            .finish_non_exhaustive()
    }
}

impl Default for TextOverlayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextOverlayStore {
    pub fn new() -> Self {
        Self::from_config(TextOverlayConfig::default())
    }

    pub fn with_settings(settings: &OverlaySettings) -> Self {
        Self::from_config(TextOverlayConfig {
            position: settings.position,
            x: settings.x,
            y: settings.y,
            scale: settings.scale.clamp(*SCALE.start(), *SCALE.end()),
            color: settings.color,
            background: settings.background,
            box_color: settings.box_color,
            padding: settings.padding,
            ..TextOverlayConfig::default()
        })
    }

    fn from_config(config: TextOverlayConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                dirty: false,
            }),
            fast: FastFlag::default(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut TextOverlayConfig)) {
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
        info!("Text overlay {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        lock_recover(&self.inner).config.enabled
    }

    #[inline]
    pub fn is_enabled_fast(&self) -> bool {
        self.fast.get()
    }

    pub fn set_text(&self, text: &str) {
        self.update(|config| {
            config.text.set(text);
        });
        debug!("Overlay text set to: {}", text);
    }

    pub fn set_position(&self, position: OverlayPosition, x: i32, y: i32) {
        self.update(|config| {
            config.position = position;
            config.x = x;
            config.y = y;
        });
    }

    pub fn set_scale(&self, scale: u32) {
        self.update(|config| config.scale = scale.clamp(*SCALE.start(), *SCALE.end()));
    }

    pub fn set_color(&self, y: u8, u: u8, v: u8) {
        self.update(|config| config.color = Yuv::new(y, u, v));
    }

    pub fn set_background(&self, enabled: bool, y: u8, u: u8, v: u8, alpha: u8) {
        self.update(|config| {
            config.background = enabled;
            config.box_color = YuvA::new(y, u, v, alpha);
        });
    }

    pub fn set_padding(&self, padding: u32) {
        self.update(|config| config.padding = padding);
    }

    pub fn clear(&self) {
        self.update(|config| {
            self.fast.publish(false);
            config.enabled = false;
            config.text.clear();
        });
        info!("Text overlay cleared");
    }

    pub fn get_config(&self) -> TextOverlayConfig {
        lock_recover(&self.inner).config
    }

    pub fn take_dirty(&self) -> bool {
        std::mem::take(&mut lock_recover(&self.inner).dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(position: OverlayPosition) -> TextOverlayConfig {
        TextOverlayConfig {
            position,
            ..Default::default()
        }
    }

    const TEXT: TextSize = TextSize { w: 100, h: 16 };

    #[test]
    fn presets_place_the_padded_box_inside_the_frame() {
        assert_eq!(config(OverlayPosition::TopLeft).place(640, 480, TEXT), (8, 8));
        assert_eq!(config(OverlayPosition::TopRight).place(640, 480, TEXT), (524, 8));
        assert_eq!(config(OverlayPosition::BottomLeft).place(640, 480, TEXT), (8, 448));
        assert_eq!(config(OverlayPosition::BottomRight).place(640, 480, TEXT), (524, 448));
        assert_eq!(config(OverlayPosition::Center).place(640, 480, TEXT), (262, 224));
    }

    #[test]
    fn custom_position_is_clamped() {
        let mut cfg = config(OverlayPosition::Custom);
        cfg.x = -50;
        cfg.y = 1000;
        assert_eq!(cfg.place(640, 480, TEXT), (0, 448));
    }

    #[test]
    fn oversized_text_pins_to_origin() {
        let cfg = config(OverlayPosition::BottomRight);
        assert_eq!(cfg.place(64, 8, TEXT), (0, 0));
    }

    #[test]
    fn setters_and_clear() {
        let store = TextOverlayStore::new();
        store.set_text("REC");
        store.set_scale(0);
        store.set_position(OverlayPosition::Custom, 12, 34);
        store.set_background(false, 1, 2, 3, 4);
        store.set_padding(3);
        store.enable(true);
        assert!(store.is_enabled_fast());
        assert!(store.take_dirty());

        let cfg = store.get_config();
        assert_eq!(cfg.text.as_str(), "REC");
        assert_eq!(cfg.scale, 1);
        assert_eq!((cfg.position, cfg.x, cfg.y), (OverlayPosition::Custom, 12, 34));
        assert!(!cfg.background);
        assert_eq!(cfg.box_color, YuvA::new(1, 2, 3, 4));
        assert_eq!(cfg.padding, 3);

        store.clear();
        assert!(!store.is_enabled_fast());
        assert!(!store.is_enabled());
        assert!(store.get_config().text.is_empty());
    }

    #[test]
    fn long_text_is_truncated() {
        let store = TextOverlayStore::new();
        store.set_text(&"x".repeat(400));
        assert_eq!(store.get_config().text.len(), TEXT_CAPACITY - 1);
    }

    #[test]
    fn position_names_deserialize() {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        let de: StrDeserializer<'_, Error> = "bottom_left".into_deserializer();
        assert_eq!(OverlayPosition::deserialize(de).unwrap(), OverlayPosition::BottomLeft);
    }

    #[test]
    fn fast_flag_follows_config_under_racing_enable_and_clear() {
        let store = TextOverlayStore::new();
        for _ in 0..500 {
            std::thread::scope(|scope| {
                scope.spawn(|| store.enable(true));
                scope.spawn(|| store.clear());
            });
            assert_eq!(store.is_enabled(), store.is_enabled_fast());
        }
    }
}
