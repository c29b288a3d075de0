//! JPEG codec collaborator
//!
//! Background images arrive as compressed JPEG. The store only needs the
//! header dimensions (to reject oversized images before allocating) and the
//! decoded RGB24 rows.

pub mod jpeg;
pub mod zune;

use crate::error::{OverlayError, Result};

pub use jpeg::JpegDecoderCodec;
pub use zune::ZuneJpegCodec;

/// Decoded image, row-major RGB24 with no row padding.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub trait JpegCodec: Send + Sync {
    /// Reads the frame header and returns `(width, height)`.
    fn probe(&self, data: &[u8]) -> Result<(u32, u32)>;

    fn decode(&self, data: &[u8]) -> Result<RgbImage>;
}

/// zune-jpeg when `fast-jpeg` is on, jpeg-decoder otherwise.
pub fn default_codec() -> &'static dyn JpegCodec {
    #[cfg(feature = "fast-jpeg")]
    {
        &ZuneJpegCodec
    }
    #[cfg(not(feature = "fast-jpeg"))]
    {
        &JpegDecoderCodec
    }
}

/// Normalizes interleaved 1, 3 or 4 channel output to RGB24.
pub(crate) fn into_rgb24(pixels: Vec<u8>, width: u32, height: u32) -> Result<RgbImage> {
    let count = width as usize * height as usize;
    if count == 0 {
        return Err(OverlayError::decode("image has no pixels"));
    }
    if pixels.len() % count != 0 {
        return Err(OverlayError::decode(format!(
            "decoder returned {} bytes for {}x{}",
            pixels.len(),
            width,
            height
        )));
    }

    let data = match pixels.len() / count {
        3 => pixels,
        1 => {
            let mut rgb = Vec::new();
            rgb.try_reserve_exact(count * 3)?;
            for &l in &pixels {
                rgb.extend_from_slice(&[l, l, l]);
            }
            rgb
        }
        4 => {
            let mut rgb = Vec::new();
            rgb.try_reserve_exact(count * 3)?;
            for px in pixels.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
            rgb
        }
        n => {
            return Err(OverlayError::UnsupportedPixelFormat(format!(
                "{n} channels"
            )))
        }
    };

    Ok(RgbImage {
        width,
        height,
        data,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_expands_to_rgb() {
        let img = into_rgb24(vec![10, 20], 2, 1).unwrap();
        assert_eq!(img.data, vec![10, 10, 10, 20, 20, 20]);
    }

    #[test]
    fn rgba_drops_alpha() {
        let img = into_rgb24(vec![1, 2, 3, 255], 1, 1).unwrap();
        assert_eq!(img.data, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_ragged_output() {
        assert!(into_rgb24(vec![0; 7], 2, 1).is_err());
        assert!(into_rgb24(vec![0; 4], 2, 1).is_err());
        assert!(into_rgb24(Vec::new(), 0, 0).is_err());
    }
}
