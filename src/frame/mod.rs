pub mod nv12;
pub mod plane;

pub use nv12::{chroma_row_bytes, chroma_rows, nv12_len, Nv12Buffer, Nv12Frame, Nv12FrameMut};
pub use plane::{Plane, PlaneMut, Subsampling, CHROMA, LUMA};
