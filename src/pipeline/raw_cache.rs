//! Most recent pre-overlay frame, for snapshot consumers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam::utils::CachePadded;
use metrics::counter;
use tracing::debug;

use crate::compose::copy_frame;
use crate::error::Result;
use crate::frame::{nv12_len, Nv12Buffer, Nv12Frame};

#[derive(Debug)]
struct Slot {
    buffer: Nv12Buffer,
    valid: bool,
}

#[derive(Debug, Default)]
struct Stats {
    frames_stored: AtomicUsize,
    frames_acquired: AtomicUsize,
    grows: AtomicUsize,
}

/// Single-slot frame cache with a hold/release hand-off.
///
/// [`store`](Self::store) overwrites the slot with every captured frame.
/// [`acquire`](Self::acquire) hands out the slot with its lock still held;
/// the capture side, and any other reader, waits until the returned guard
/// is released or dropped.
#[derive(Debug)]
pub struct RawFrameCache {
    slot: Mutex<Slot>,
    stats: CachePadded<Stats>,
}

impl Default for RawFrameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RawFrameCache {
    /// Starts empty; the first `store` allocates.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                buffer: Nv12Buffer::with_capacity_bytes(0),
                valid: false,
            }),
            stats: CachePadded::new(Stats::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies `frame` into the cache, growing the buffer when needed.
    ///
    /// A failed allocation leaves the previous frame in place.
    pub fn store(&self, frame: &Nv12Frame) -> Result<()> {
        let (width, height) = (frame.width(), frame.height());
        let needed = nv12_len(width, height);

        let mut slot = self.lock();
        if needed > slot.buffer.capacity() {
            slot.buffer.reserve_bytes(needed)?;
            self.stats.grows.fetch_add(1, Ordering::Relaxed);
            debug!("Raw frame cache grown to {} bytes", needed);
        }
        slot.buffer.reshape(width, height)?;
        copy_frame(frame, &mut slot.buffer.view_mut());
        slot.valid = true;
        drop(slot);

        self.stats.frames_stored.fetch_add(1, Ordering::Relaxed);
        counter!("raw_frames_stored").increment(1);
        Ok(())
    }

    /// Borrows the cached frame, holding the cache lock until the guard goes.
    ///
    /// Blocks while another guard is alive. Returns `None` before the first
    /// store or after [`invalidate`](Self::invalidate).
    pub fn acquire(&self) -> Option<RawFrameGuard<'_>> {
        let slot = self.lock();
        if !slot.valid || slot.buffer.capacity() == 0 {
            return None;
        }
        self.stats.frames_acquired.fetch_add(1, Ordering::Relaxed);
        Some(RawFrameGuard { slot })
    }

    pub fn has_frame(&self) -> bool {
        self.lock().valid
    }

    /// Bytes currently allocated for frame data.
    pub fn capacity(&self) -> usize {
        self.lock().buffer.capacity()
    }

    /// Marks the cached frame stale without freeing it.
    pub fn invalidate(&self) {
        self.lock().valid = false;
    }

    /// (stored, acquired, grows)
    pub fn stats(&self) -> (usize, usize, usize) {
        (
            self.stats.frames_stored.load(Ordering::Relaxed),
            self.stats.frames_acquired.load(Ordering::Relaxed),
            self.stats.grows.load(Ordering::Relaxed),
        )
    }
}

/// Read access to the cached frame. The cache stays locked while this lives.
pub struct RawFrameGuard<'a> {
    slot: MutexGuard<'a, Slot>,
}

impl RawFrameGuard<'_> {
    pub fn frame(&self) -> Nv12Frame<'_> {
        self.slot.buffer.view()
    }

    /// Packed NV12 bytes, luma followed by chroma.
    pub fn bytes(&self) -> &[u8] {
        self.slot.buffer.as_bytes()
    }

    pub fn width(&self) -> u32 {
        self.slot.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.slot.buffer.height()
    }

    pub fn y_stride(&self) -> usize {
        self.slot.buffer.stride()
    }

    pub fn uv_stride(&self) -> usize {
        self.slot.buffer.stride()
    }

    /// Unlocks the cache. Dropping the guard does the same.
    pub fn release(self) {}
}
