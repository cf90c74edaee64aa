//! Zone sampling, annotation, and preview encoding.

use chrono::{DateTime, FixedOffset};
use image::{codecs::jpeg::JpegEncoder, ImageBuffer, Rgb as ImageRgb};
use spectra_types::{
    color::Rgb,
    frame::{VideoFrame, BYTES_PER_PIXEL},
    snapshot::{Snapshot, ZoneColor},
    Result, SpectraError,
};

mod zone;

pub use zone::{ZoneGrid, ZoneRect};

/// Outline color in capture order. Renders blue in the preview.
pub const OUTLINE_BGR: [u8; 3] = [255, 0, 0];
pub const OUTLINE_THICKNESS: u32 = 2;

/// Mean color over all 7 zones of a (mirrored) frame, stamped with the
/// cycle's local timestamp. Zone means stay in capture (blue, green, red)
/// order until the display swap inside [`Rgb::from_bgr`].
pub fn analyze(
    frame: &VideoFrame,
    grid: &ZoneGrid,
    timestamp: DateTime<FixedOffset>,
) -> Result<Snapshot> {
    let zones = grid
        .zones()
        .enumerate()
        .map(|(i, rect)| ZoneColor::from_rgb(i as u8 + 1, Rgb::from_bgr(zone_mean_bgr(frame, rect))))
        .collect();
    Snapshot::new(timestamp, zones)
}

/// Per-channel integer mean over the zone's pixel block, truncating.
pub fn zone_mean_bgr(frame: &VideoFrame, rect: ZoneRect) -> [u8; 3] {
    let mut sums = [0u64; 3];
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let pixel = frame.pixel(x, y);
            sums[0] += u64::from(pixel[0]);
            sums[1] += u64::from(pixel[1]);
            sums[2] += u64::from(pixel[2]);
        }
    }
    let count = u64::from(rect.width) * u64::from(rect.height);
    [
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ]
}

/// A copy of the frame with each zone outlined for the preview stream.
pub fn annotate(frame: &VideoFrame, grid: &ZoneGrid) -> Result<VideoFrame> {
    let width = frame.width();
    let height = frame.height();
    let mut data = frame.data().to_vec();
    for rect in grid.zones() {
        draw_outline(&mut data, width, rect);
    }
    VideoFrame::from_bgr(width, height, data)
}

fn draw_outline(data: &mut [u8], frame_width: u32, rect: ZoneRect) {
    let thickness = OUTLINE_THICKNESS.min(rect.height).min(rect.width);
    for t in 0..thickness {
        for x in rect.x..rect.x + rect.width {
            paint(data, frame_width, x, rect.y + t);
            paint(data, frame_width, x, rect.y + rect.height - 1 - t);
        }
        for y in rect.y..rect.y + rect.height {
            paint(data, frame_width, rect.x + t, y);
            paint(data, frame_width, rect.x + rect.width - 1 - t, y);
        }
    }
}

fn paint(data: &mut [u8], frame_width: u32, x: u32, y: u32) {
    let idx = (y as usize * frame_width as usize + x as usize) * BYTES_PER_PIXEL;
    data[idx..idx + BYTES_PER_PIXEL].copy_from_slice(&OUTLINE_BGR);
}

/// Swap the frame into display order and compress it for the MJPEG stream.
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> Result<Vec<u8>> {
    let mut rgb = Vec::with_capacity(frame.data().len());
    for pixel in frame.data().chunks_exact(BYTES_PER_PIXEL) {
        rgb.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }

    let img: ImageBuffer<ImageRgb<u8>, _> = ImageBuffer::from_raw(frame.width(), frame.height(), rgb)
        .ok_or_else(|| vision_error("pixel buffer does not match frame dimensions"))?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|err| vision_error(format!("jpeg encoding failed: {err}")))?;
    Ok(buf)
}

pub fn vision_error(message: impl Into<String>) -> SpectraError {
    SpectraError::Vision(message.into())
}
