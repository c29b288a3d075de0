//! Overlay configuration stores
//!
//! One store per overlay subsystem. Each guards its configuration with a
//! mutex written from the control path, and mirrors its `enabled` state into
//! a [`FastFlag`] the encoder polls without locking.

pub mod blocking;
pub mod overlay;
pub mod text_buf;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam::utils::CachePadded;

pub use blocking::{BlockingConfig, BlockingStore, PreviewConfig, MAX_BG_BYTES};
pub use overlay::{OverlayPosition, TextOverlayConfig, TextOverlayStore};
pub use text_buf::FixedText;

/// Configuration is plain data, so a writer that panicked cannot leave it
/// structurally broken; keep serving it.
#[inline]
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock-free "subsystem active" flag on its own cache line.
#[derive(Debug, Default)]
pub struct FastFlag(CachePadded<AtomicBool>);

impl FastFlag {
    pub fn new(value: bool) -> Self {
        Self(CachePadded::new(AtomicBool::new(value)))
    }

    #[inline]
    pub fn publish(&self, value: bool) {
        self.0.store(value, Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
