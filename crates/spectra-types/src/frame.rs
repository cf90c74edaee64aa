use chrono::{DateTime, Utc};

use crate::{Result, SpectraError};

/// Packed channel count for capture-order (blue, green, red) pixels.
pub const BYTES_PER_PIXEL: usize = 3;

/// One captured frame: a row-major grid of capture-order (blue, green, red)
/// triples. Immutable after capture; the sampler replaces it wholesale every
/// cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl VideoFrame {
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(SpectraError::Capture(format!(
                "frame buffer length {} does not match {}x{} bgr24 ({expected} bytes)",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Capture-order triple at (x, y). Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// A copy with pixel order reversed within each row, preserving the
    /// capture timestamp.
    pub fn mirrored(&self) -> Self {
        let row_len = self.width as usize * BYTES_PER_PIXEL;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len) {
            for pixel in row.chunks_exact(BYTES_PER_PIXEL).rev() {
                data.extend_from_slice(pixel);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
            captured_at: self.captured_at,
        }
    }
}
