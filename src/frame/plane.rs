//! Bounds-checked plane descriptors
//!
//! A plane is a run of rows inside a byte slice. `width` is the number of
//! meaningful bytes per row, `stride` the distance between row starts.

use crate::error::{OverlayError, Result};

/// How a plane is subsampled relative to the full-resolution frame.
///
/// NV12 luma is one byte per pixel at full resolution. Chroma stores one
/// interleaved U/V pair per 2x2 pixel block, so every other row is present
/// and each sample spans two bytes at the same horizontal byte offset as the
/// luma pixel it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsampling {
    pub vertical: usize,
    pub bytes_per_sample: usize,
}

pub const LUMA: Subsampling = Subsampling {
    vertical: 1,
    bytes_per_sample: 1,
};

pub const CHROMA: Subsampling = Subsampling {
    vertical: 2,
    bytes_per_sample: 2,
};

impl Subsampling {
    /// Whether the full-resolution pixel (x, y) owns a sample in this plane.
    #[inline]
    pub fn owns(&self, x: usize, y: usize) -> bool {
        x % self.bytes_per_sample == 0 && y % self.vertical == 0
    }
}

fn required_len(width: usize, rows: usize, stride: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows - 1) * stride + width
    }
}

fn validate(len: usize, width: usize, rows: usize, stride: usize) -> Result<()> {
    if stride < width {
        return Err(OverlayError::invalid_frame(format!(
            "stride {stride} smaller than row width {width}"
        )));
    }
    let needed = required_len(width, rows, stride);
    if len < needed {
        return Err(OverlayError::invalid_frame(format!(
            "plane needs {needed} bytes, got {len}"
        )));
    }
    Ok(())
}

/// Read-only plane view.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    data: &'a [u8],
    width: usize,
    rows: usize,
    stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], width: usize, rows: usize, stride: usize) -> Result<Self> {
        validate(data.len(), width, rows, stride)?;
        Ok(Self {
            data,
            width,
            rows,
            stride,
        })
    }

    /// Caller guarantees `data` covers `rows` rows of `stride` bytes.
    pub(crate) fn packed(data: &'a [u8], width: usize, rows: usize, stride: usize) -> Self {
        debug_assert!(validate(data.len(), width, rows, stride).is_ok());
        Self {
            data,
            width,
            rows,
            stride,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes spanned by the plane, including trailing row padding except after the last row.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.data[..required_len(self.width, self.rows, self.stride)]
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.stride;
        self.data.get(start..start + self.width)
    }
}

/// Mutable plane view.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    width: usize,
    rows: usize,
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    pub fn new(data: &'a mut [u8], width: usize, rows: usize, stride: usize) -> Result<Self> {
        validate(data.len(), width, rows, stride)?;
        Ok(Self {
            data,
            width,
            rows,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub(crate) fn packed(data: &'a mut [u8], width: usize, rows: usize, stride: usize) -> Self {
        debug_assert!(validate(data.len(), width, rows, stride).is_ok());
        Self {
            data,
            width,
            rows,
            stride,
        }
    }

    pub fn as_plane(&self) -> Plane<'_> {
        Plane {
            data: &*self.data,
            width: self.width,
            rows: self.rows,
            stride: self.stride,
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = required_len(self.width, self.rows, self.stride);
        &mut self.data[..len]
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.stride;
        self.data.get(start..start + self.width)
    }

    #[inline]
    pub fn row_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.stride;
        self.data.get_mut(start..start + self.width)
    }

    /// Repeats `pattern` across every row. A single-byte pattern also
    /// overwrites row padding.
    pub fn fill(&mut self, pattern: &[u8]) {
        match pattern {
            [] => {}
            [value] => self.as_bytes_mut().fill(*value),
            _ => {
                for index in 0..self.rows {
                    if let Some(row) = self.row_mut(index) {
                        for chunk in row.chunks_mut(pattern.len()) {
                            chunk.copy_from_slice(&pattern[..chunk.len()]);
                        }
                    }
                }
            }
        }
    }
}
