use zune_jpeg::JpegDecoder;

use super::{into_rgb24, JpegCodec, RgbImage};
use crate::error::{OverlayError, Result};

/// SIMD-accelerated decoder, RGB output by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZuneJpegCodec;

impl JpegCodec for ZuneJpegCodec {
    fn probe(&self, data: &[u8]) -> Result<(u32, u32)> {
        let mut decoder = JpegDecoder::new(data);
        decoder
            .decode_headers()
            .map_err(|e| OverlayError::decode(format!("{e:?}")))?;
        let (width, height) = decoder
            .dimensions()
            .ok_or_else(|| OverlayError::decode("missing frame header"))?;
        Ok((width as u32, height as u32))
    }

    fn decode(&self, data: &[u8]) -> Result<RgbImage> {
        let mut decoder = JpegDecoder::new(data);
        let pixels = decoder
            .decode()
            .map_err(|e| OverlayError::decode(format!("{e:?}")))?;
        let (width, height) = decoder
            .dimensions()
            .ok_or_else(|| OverlayError::decode("missing frame header"))?;
        into_rgb24(pixels, width as u32, height as u32)
    }
}
