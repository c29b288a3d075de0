//! Capture-to-encoder plumbing: the raw frame cache and the per-frame hook

pub mod processor;
pub mod raw_cache;

pub use processor::{FrameProcessor, FrameRoute};
pub use raw_cache::{RawFrameCache, RawFrameGuard};
