use std::collections::TryReserveError;

pub type Result<T> = std::result::Result<T, OverlayError>;

#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    #[error("empty image input")]
    EmptyInput,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("image too large: {width}x{height} needs {bytes} bytes (max {max})")]
    TooLarge {
        width: u32,
        height: u32,
        bytes: usize,
        max: usize,
    },

    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("font error: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OverlayError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }
}
