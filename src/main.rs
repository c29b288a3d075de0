//! Apollo compositor demo
//!
//! Drives synthetic color-bar frames through the overlay pipeline while a
//! scripted control task flips the blocking screen on and off, and dumps
//! luma snapshots of the raw and composited frames as PNG.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use apollo_compositor::frame::Nv12FrameMut;
use apollo_compositor::{
    rgb_to_yuv, run_control_loop, BlockingStore, Compositor, ControlCommand, FontSet,
    FrameProcessor, Nv12Buffer, Nv12Frame, RawFrameCache, Settings, Stores, TextOverlay,
    TextOverlayStore, TextPath,
};
use bytes::Bytes;
use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 75% SMPTE-style bars.
const BARS: [(u8, u8, u8); 8] = [
    (191, 191, 191),
    (191, 191, 0),
    (0, 191, 191),
    (0, 191, 0),
    (191, 0, 191),
    (191, 0, 0),
    (0, 0, 191),
    (16, 16, 16),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("apollo_compositor=debug"));
    let fmt = tracing_subscriber::fmt::layer().with_timer(tracing_subscriber::fmt::time::uptime());
    let registry = tracing_subscriber::registry().with(filter).with(fmt);
    #[cfg(feature = "profiling")]
    let registry = registry.with(tracing_tracy::TracyLayer::default());
    registry.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    init_tracing();

    info!("Apollo compositor launching...");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    let (width, height) = (settings.pipeline.width, settings.pipeline.height);
    if width == 0 || height == 0 {
        return Err(eyre!("pipeline size must be non-zero, got {}x{}", width, height));
    }

    let stores = Stores {
        blocking: Arc::new(BlockingStore::with_settings(&settings.blocking)),
        overlay: Arc::new(TextOverlayStore::with_settings(&settings.overlay)),
    };
    let fonts = FontSet::load(
        settings.blocking.headline_font.as_deref(),
        settings.blocking.stats_font.as_deref(),
    );
    info!(vector = fonts.uses_vector(), "Fonts ready");

    let cache = Arc::new(RawFrameCache::new());
    let mut processor = FrameProcessor::new()
        .with_compositor(Compositor::new(Arc::clone(&stores.blocking), fonts))
        .with_overlay(TextOverlay::new(
            Arc::clone(&stores.overlay),
            TextPath::load(settings.overlay.font.as_deref()),
        ));
    if settings.pipeline.raw_cache {
        processor = processor.with_raw_cache(Arc::clone(&cache));
    }

    // Control channel
    let (tx, rx) = flume::bounded::<ControlCommand>(settings.pipeline.control_queue.max(1));
    let control_handle = tokio::spawn(run_control_loop(rx, stores.clone()));

    if let Some(path) = &settings.demo.background_jpeg {
        match map_file(path) {
            Ok(jpeg) => tx.send_async(ControlCommand::SetBackground { jpeg }).await?,
            Err(e) => warn!("Background {} unavailable: {}", path.display(), e),
        }
    }
    for command in [
        ControlCommand::SetHeadline {
            text: settings.demo.headline.clone(),
        },
        ControlCommand::SetPreview {
            x: -16,
            y: -16,
            w: width / 4,
            h: height / 4,
            enabled: true,
        },
        ControlCommand::OverlayText {
            text: settings.demo.overlay_text.clone(),
        },
        ControlCommand::OverlayEnable { enabled: true },
    ] {
        tx.send_async(command).await?;
    }

    let frames = settings.demo.frames;
    let fps = settings.pipeline.fps.max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    let mut src = Nv12Buffer::new(width, height);
    let mut dst = Nv12Buffer::new(width, height);

    info!("Running {} frames at {}x{}@{}", frames, width, height, fps);
    for index in 0..frames {
        ticker.tick().await;

        if index == frames / 3 {
            tx.send_async(ControlCommand::BlockingEnable { enabled: true }).await?;
        } else if index == frames * 2 / 3 {
            tx.send_async(ControlCommand::BlockingClear).await?;
        }
        if index % fps == 0 {
            let stats = format!("{} | frame {}", settings.demo.stats, index);
            // Dropping a stats refresh is fine when the control task lags.
            if tx.try_send(ControlCommand::SetStats { text: stats }).is_err() {
                warn!("Control queue full, stats update dropped");
            }
        }

        color_bars(&mut src.view_mut(), index);
        let route = processor.process(&src.view(), &mut dst.view_mut());

        let every = settings.demo.snapshot_every;
        if every > 0 && index % every == 0 {
            save_snapshots(&cache, &dst.view(), &settings.demo.snapshot_dir, index)?;
            info!(?route, "Snapshot {} written", index);
        }
    }

    drop(tx);
    control_handle.await?;

    let (stored, acquired, grows) = cache.stats();
    info!(stored, acquired, grows, "Raw frame cache");
    info!("Apollo compositor shutting down after {} frames", processor.frames_processed());
    Ok(())
}

fn map_file(path: &Path) -> std::io::Result<Bytes> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the mapping is copied out immediately and not kept past this call.
    let map = unsafe { memmap2::Mmap::map(&file)? };
    Ok(Bytes::copy_from_slice(&map))
}

/// Scrolling vertical bars.
fn color_bars(dst: &mut Nv12FrameMut, offset: u32) {
    let width = dst.width() as usize;
    let colors = BARS.map(|(r, g, b)| rgb_to_yuv(r, g, b));
    let bar_at = |x: usize| colors[((x + offset as usize * 4) * BARS.len() / width) % BARS.len()];

    let luma = dst.y_mut();
    for row in 0..luma.rows() {
        if let Some(line) = luma.row_mut(row) {
            for (x, px) in line.iter_mut().enumerate() {
                *px = bar_at(x).y;
            }
        }
    }
    let chroma = dst.uv_mut();
    for row in 0..chroma.rows() {
        if let Some(line) = chroma.row_mut(row) {
            for (pair, px) in line.chunks_exact_mut(2).enumerate() {
                let color = bar_at(pair * 2);
                px.copy_from_slice(&[color.u, color.v]);
            }
        }
    }
}

fn luma_image(frame: &Nv12Frame) -> Result<image::GrayImage> {
    let luma = frame.y();
    let mut pixels = Vec::with_capacity(luma.width() * luma.rows());
    for row in 0..luma.rows() {
        if let Some(line) = luma.row(row) {
            pixels.extend_from_slice(line);
        }
    }
    image::GrayImage::from_raw(frame.width(), frame.height(), pixels)
        .ok_or_else(|| eyre!("luma plane does not match {}x{}", frame.width(), frame.height()))
}

fn save_snapshots(cache: &RawFrameCache, output: &Nv12Frame, dir: &Path, index: u32) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    // Copy out and release before encoding so capture is not held up.
    let raw = match cache.acquire() {
        Some(guard) => {
            let image = luma_image(&guard.frame());
            guard.release();
            Some(image?)
        }
        None => None,
    };
    if let Some(raw) = raw {
        raw.save(dir.join(format!("raw-{index:05}.png")))?;
    }
    luma_image(output)?.save(dir.join(format!("out-{index:05}.png")))?;
    Ok(())
}
