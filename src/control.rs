//! Control-channel commands
//!
//! Whatever transport the host uses (socket, HTTP, stdin) decodes requests
//! into [`ControlCommand`] and pushes them down a flume channel. The control
//! task applies them to the stores one at a time.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::store::{BlockingStore, OverlayPosition, TextOverlayStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ControlCommand {
    BlockingEnable { enabled: bool },
    SetBackground { jpeg: Bytes },
    SetPreview { x: i32, y: i32, w: u32, h: u32, enabled: bool },
    SetHeadline { text: String },
    SetStats { text: String },
    SetHeadlineScale { scale: u32 },
    SetStatsScale { scale: u32 },
    SetTextColor { y: u8, u: u8, v: u8 },
    SetBoxColor { y: u8, u: u8, v: u8, alpha: u8 },
    BlockingClear,
    OverlayEnable { enabled: bool },
    OverlayText { text: String },
    OverlayPosition { position: OverlayPosition, x: i32, y: i32 },
    OverlayScale { scale: u32 },
    OverlayColor { y: u8, u: u8, v: u8 },
    OverlayBackground { enabled: bool, y: u8, u: u8, v: u8, alpha: u8 },
    OverlayPadding { padding: u32 },
    OverlayClear,
}

/// Handles to every store the control channel can reach.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub blocking: Arc<BlockingStore>,
    pub overlay: Arc<TextOverlayStore>,
}

impl ControlCommand {
    /// Only background ingestion can fail; every other setter clamps or truncates.
    pub fn apply(self, stores: &Stores) -> Result<()> {
        let blocking = &stores.blocking;
        let overlay = &stores.overlay;
        match self {
            Self::BlockingEnable { enabled } => blocking.enable(enabled),
            Self::SetBackground { jpeg } => return blocking.set_background_jpeg(&jpeg),
            Self::SetPreview { x, y, w, h, enabled } => blocking.set_preview(x, y, w, h, enabled),
            Self::SetHeadline { text } => blocking.set_headline(&text),
            Self::SetStats { text } => blocking.set_stats(&text),
            Self::SetHeadlineScale { scale } => blocking.set_headline_scale(scale),
            Self::SetStatsScale { scale } => blocking.set_stats_scale(scale),
            Self::SetTextColor { y, u, v } => blocking.set_text_color(y, u, v),
            Self::SetBoxColor { y, u, v, alpha } => blocking.set_box_color(y, u, v, alpha),
            Self::BlockingClear => blocking.clear(),
            Self::OverlayEnable { enabled } => overlay.enable(enabled),
            Self::OverlayText { text } => overlay.set_text(&text),
            Self::OverlayPosition { position, x, y } => overlay.set_position(position, x, y),
            Self::OverlayScale { scale } => overlay.set_scale(scale),
            Self::OverlayColor { y, u, v } => overlay.set_color(y, u, v),
            Self::OverlayBackground {
                enabled,
                y,
                u,
                v,
                alpha,
            } => overlay.set_background(enabled, y, u, v, alpha),
            Self::OverlayPadding { padding } => overlay.set_padding(padding),
            Self::OverlayClear => overlay.clear(),
        }
        Ok(())
    }

    /// Short name for logs; never includes payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlockingEnable { .. } => "blocking_enable",
            Self::SetBackground { .. } => "set_background",
            Self::SetPreview { .. } => "set_preview",
            Self::SetHeadline { .. } => "set_headline",
            Self::SetStats { .. } => "set_stats",
            Self::SetHeadlineScale { .. } => "set_headline_scale",
            Self::SetStatsScale { .. } => "set_stats_scale",
            Self::SetTextColor { .. } => "set_text_color",
            Self::SetBoxColor { .. } => "set_box_color",
            Self::BlockingClear => "blocking_clear",
            Self::OverlayEnable { .. } => "overlay_enable",
            Self::OverlayText { .. } => "overlay_text",
            Self::OverlayPosition { .. } => "overlay_position",
            Self::OverlayScale { .. } => "overlay_scale",
            Self::OverlayColor { .. } => "overlay_color",
            Self::OverlayBackground { .. } => "overlay_background",
            Self::OverlayPadding { .. } => "overlay_padding",
            Self::OverlayClear => "overlay_clear",
        }
    }
}

/// Applies commands until every sender is dropped.
///
/// Background decoding runs on the blocking pool so it never stalls the
/// runtime.
pub async fn run_control_loop(rx: flume::Receiver<ControlCommand>, stores: Stores) {
    info!("Control loop started");
    while let Ok(command) = rx.recv_async().await {
        let name = command.name();
        debug!("Applying {}", name);

        let result = match command {
            ControlCommand::SetBackground { .. } => {
                let stores = stores.clone();
                match tokio::task::spawn_blocking(move || command.apply(&stores)).await {
                    Ok(result) => result,
                    Err(e) => {
                        error!("{} task failed: {}", name, e);
                        continue;
                    }
                }
            }
            command => command.apply(&stores),
        };

        if let Err(e) = result {
            error!("{} failed: {}", name, e);
        }
    }
    info!("Control loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_reach_their_store() {
        let stores = Stores::default();
        for command in [
            ControlCommand::SetHeadline {
                text: "Be right back".into(),
            },
            ControlCommand::SetStatsScale { scale: 42 },
            ControlCommand::BlockingEnable { enabled: true },
            ControlCommand::OverlayText { text: "LIVE".into() },
            ControlCommand::OverlayPosition {
                position: OverlayPosition::BottomLeft,
                x: 0,
                y: 0,
            },
        ] {
            command.apply(&stores).unwrap();
        }

        let blocking = stores.blocking.get_config();
        assert_eq!(blocking.headline.as_str(), "Be right back");
        assert_eq!(blocking.stats_scale, 10);
        assert!(stores.blocking.is_enabled_fast());
        let overlay = stores.overlay.get_config();
        assert_eq!(overlay.text.as_str(), "LIVE");
        assert_eq!(overlay.position, OverlayPosition::BottomLeft);
        assert!(!stores.overlay.is_enabled_fast());
    }

    #[test]
    fn bad_background_is_reported() {
        let stores = Stores::default();
        let err = ControlCommand::SetBackground {
            jpeg: Bytes::from_static(b"definitely not a jpeg"),
        }
        .apply(&stores);
        assert!(err.is_err());
        assert!(!stores.blocking.get_config().bg_valid);
    }

    #[test]
    fn empty_background_is_rejected() {
        let stores = Stores::default();
        let err = ControlCommand::SetBackground { jpeg: Bytes::new() }.apply(&stores);
        assert!(matches!(err, Err(crate::error::OverlayError::EmptyInput)));
    }

    #[test_log::test(tokio::test)]
    async fn loop_drains_channel_then_exits() {
        let stores = Stores::default();
        let (tx, rx) = flume::unbounded();
        tx.send(ControlCommand::OverlayEnable { enabled: true }).unwrap();
        tx.send(ControlCommand::SetBackground { jpeg: Bytes::new() })
            .unwrap();
        tx.send(ControlCommand::OverlayScale { scale: 7 }).unwrap();
        drop(tx);

        run_control_loop(rx, stores.clone()).await;
        assert!(stores.overlay.is_enabled_fast());
        assert_eq!(stores.overlay.get_config().scale, 7);
    }
}
