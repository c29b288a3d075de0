use super::plane::{Plane, PlaneMut, Subsampling, CHROMA};
use crate::error::{OverlayError, Result};

/// Bytes per chroma row: one U/V pair per two luma pixels, odd widths rounded up.
#[inline]
pub fn chroma_row_bytes(width: u32) -> usize {
    ((width as usize) + 1) & !1
}

#[inline]
pub fn chroma_rows(height: u32) -> usize {
    (height as usize).div_ceil(2)
}

/// Size of a packed NV12 image whose rows are padded to an even stride.
pub fn nv12_len(width: u32, height: u32) -> usize {
    let stride = chroma_row_bytes(width);
    stride * height as usize + stride * chroma_rows(height)
}

/// Borrowed NV12 frame (source side)
#[derive(Debug, Clone, Copy)]
pub struct Nv12Frame<'a> {
    y: Plane<'a>,
    uv: Plane<'a>,
    width: u32,
    height: u32,
}

impl<'a> Nv12Frame<'a> {
    pub fn new(
        y: &'a [u8],
        uv: &'a [u8],
        width: u32,
        height: u32,
        y_stride: usize,
        uv_stride: usize,
    ) -> Result<Self> {
        Ok(Self {
            y: Plane::new(y, width as usize, height as usize, y_stride)?,
            uv: Plane::new(uv, chroma_row_bytes(width), chroma_rows(height), uv_stride)?,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn y(&self) -> Plane<'a> {
        self.y
    }

    pub fn uv(&self) -> Plane<'a> {
        self.uv
    }

    pub fn plane(&self, sub: Subsampling) -> Plane<'a> {
        if sub == CHROMA {
            self.uv
        } else {
            self.y
        }
    }

    pub fn same_size(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// Borrowed NV12 frame (destination side)
#[derive(Debug)]
pub struct Nv12FrameMut<'a> {
    y: PlaneMut<'a>,
    uv: PlaneMut<'a>,
    width: u32,
    height: u32,
}

impl<'a> Nv12FrameMut<'a> {
    pub fn new(
        y: &'a mut [u8],
        uv: &'a mut [u8],
        width: u32,
        height: u32,
        y_stride: usize,
        uv_stride: usize,
    ) -> Result<Self> {
        Ok(Self {
            y: PlaneMut::new(y, width as usize, height as usize, y_stride)?,
            uv: PlaneMut::new(uv, chroma_row_bytes(width), chroma_rows(height), uv_stride)?,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn y_mut(&mut self) -> &mut PlaneMut<'a> {
        &mut self.y
    }

    pub fn uv_mut(&mut self) -> &mut PlaneMut<'a> {
        &mut self.uv
    }

    pub fn plane_mut(&mut self, sub: Subsampling) -> &mut PlaneMut<'a> {
        if sub == CHROMA {
            &mut self.uv
        } else {
            &mut self.y
        }
    }

    pub fn as_frame(&self) -> Nv12Frame<'_> {
        Nv12Frame {
            y: self.y.as_plane(),
            uv: self.uv.as_plane(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Owned, packed NV12 image.
///
/// `reshape` only changes the geometry and fails when the new image would not
/// fit; growing the allocation is an explicit [`reserve_bytes`](Self::reserve_bytes).
#[derive(Clone)]
pub struct Nv12Buffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for Nv12Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nv12Buffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("capacity", &self.data.len())
            .finish()
    }
}

impl Nv12Buffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; nv12_len(width, height)],
            width,
            height,
        }
    }

    /// Zero-sized image backed by `capacity` bytes.
    pub fn with_capacity_bytes(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            width: 0,
            height: 0,
        }
    }

    pub fn reshape(&mut self, width: u32, height: u32) -> Result<()> {
        let needed = nv12_len(width, height);
        if needed > self.data.len() {
            return Err(OverlayError::TooLarge {
                width,
                height,
                bytes: needed,
                max: self.data.len(),
            });
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Grows the allocation to at least `bytes`. Never shrinks.
    pub fn reserve_bytes(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.data.len() {
            self.data.try_reserve_exact(bytes - self.data.len())?;
            self.data.resize(bytes, 0);
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        chroma_row_bytes(self.width)
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes of the current image (luma followed by chroma).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..nv12_len(self.width, self.height)]
    }

    pub fn view(&self) -> Nv12Frame<'_> {
        let stride = self.stride();
        let split = stride * self.height as usize;
        let (y, uv) = self.as_bytes().split_at(split);
        Nv12Frame {
            y: Plane::packed(y, self.width as usize, self.height as usize, stride),
            uv: Plane::packed(uv, stride, chroma_rows(self.height), stride),
            width: self.width,
            height: self.height,
        }
    }

    pub fn view_mut(&mut self) -> Nv12FrameMut<'_> {
        let stride = self.stride();
        let (width, height) = (self.width, self.height);
        let len = nv12_len(width, height);
        let (y, uv) = self.data[..len].split_at_mut(stride * height as usize);
        Nv12FrameMut {
            y: PlaneMut::packed(y, width as usize, height as usize, stride),
            uv: PlaneMut::packed(uv, stride, chroma_rows(height), stride),
            width,
            height,
        }
    }
}
