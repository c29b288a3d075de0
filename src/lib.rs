pub mod codec;
pub mod color;
pub mod compose;
pub mod compositor;
pub mod control;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod store;
pub mod text;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use color::{rgb24_to_nv12, rgb_to_yuv, Yuv, YuvA};
pub use compositor::{resolve_preview_rect, Compositor, TextOverlay};
pub use control::{run_control_loop, ControlCommand, Stores};
pub use error::{OverlayError, Result};
pub use frame::{Nv12Buffer, Nv12Frame, Nv12FrameMut};
pub use pipeline::{FrameProcessor, FrameRoute, RawFrameCache, RawFrameGuard};
pub use store::{BlockingStore, OverlayPosition, TextOverlayStore};
pub use text::{FontSet, TextPath};

/// Process configuration, layered from an optional TOML file and
/// `APOLLO__`-prefixed environment variables (`APOLLO__PIPELINE__FPS=60`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub blocking: BlockingSettings,
    pub overlay: OverlaySettings,
    pub pipeline: PipelineSettings,
    pub demo: DemoSettings,
}

/// Initial state of the blocking subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingSettings {
    pub headline_scale: u32,
    pub stats_scale: u32,
    pub text_color: Yuv,
    pub box_color: YuvA,
    /// TrueType/OpenType face for the headline; bitmap font when unset or unreadable.
    pub headline_font: Option<PathBuf>,
    pub stats_font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub position: OverlayPosition,
    pub x: i32,
    pub y: i32,
    pub scale: u32,
    pub color: Yuv,
    pub background: bool,
    pub box_color: YuvA,
    pub padding: u32,
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub raw_cache: bool,
    pub control_queue: usize,
}

/// Knobs for the bundled demo binary only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub frames: u32,
    pub background_jpeg: Option<PathBuf>,
    pub headline: String,
    pub stats: String,
    pub overlay_text: String,
    pub snapshot_every: u32,
    pub snapshot_dir: PathBuf,
}

impl Default for BlockingSettings {
    fn default() -> Self {
        Self {
            headline_scale: store::blocking::DEFAULT_HEADLINE_SCALE,
            stats_scale: store::blocking::DEFAULT_STATS_SCALE,
            text_color: store::blocking::DEFAULT_TEXT_COLOR,
            box_color: store::blocking::DEFAULT_BOX_COLOR,
            headline_font: None,
            stats_font: None,
        }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            position: OverlayPosition::TopRight,
            x: 0,
            y: 0,
            scale: 2,
            color: Yuv::new(235, 128, 128),
            background: true,
            box_color: YuvA::new(16, 128, 128, 180),
            padding: 8,
            font: None,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            raw_cache: true,
            control_queue: 32,
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            frames: 90,
            background_jpeg: None,
            headline: "Stream paused".into(),
            stats: "viewers: 0".into(),
            overlay_text: "LIVE".into(),
            snapshot_every: 30,
            snapshot_dir: PathBuf::from("snapshots"),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("APOLLO").separator("__"))
            .build()?
            .try_deserialize()
    }
}
