use jpeg_decoder::{Decoder, PixelFormat as JpegPixelFormat};

use super::{into_rgb24, JpegCodec, RgbImage};
use crate::error::{OverlayError, Result};

/// Pure-Rust baseline/progressive decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoderCodec;

impl JpegCodec for JpegDecoderCodec {
    fn probe(&self, data: &[u8]) -> Result<(u32, u32)> {
        let mut decoder = Decoder::new(data);
        decoder
            .read_info()
            .map_err(|e| OverlayError::decode(e.to_string()))?;
        let info = decoder
            .info()
            .ok_or_else(|| OverlayError::decode("missing frame header"))?;
        Ok((info.width as u32, info.height as u32))
    }

    fn decode(&self, data: &[u8]) -> Result<RgbImage> {
        let mut decoder = Decoder::new(data);
        let pixels = decoder
            .decode()
            .map_err(|e| OverlayError::decode(e.to_string()))?;
        let info = decoder
            .info()
            .ok_or_else(|| OverlayError::decode("missing frame header"))?;

        match info.pixel_format {
            JpegPixelFormat::RGB24 | JpegPixelFormat::L8 => {
                into_rgb24(pixels, info.width as u32, info.height as u32)
            }
            other => Err(OverlayError::UnsupportedPixelFormat(format!("{other:?}"))),
        }
    }
}
