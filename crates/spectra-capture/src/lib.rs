//! Video source abstraction layer.

use async_trait::async_trait;
use spectra_types::{
    config::CaptureConfig,
    frame::{VideoFrame, BYTES_PER_PIXEL},
    Result, SpectraError,
};
use tracing::info;

mod ffmpeg;

pub use ffmpeg::FfmpegSource;

/// A live feed of capture-order (blue, green, red) frames.
///
/// `read_frame` failures are expected operational noise (device unplugged,
/// stream hiccup) and must leave the source able to retry on the next call.
#[async_trait]
pub trait FrameSource: Send {
    async fn connect(&mut self) -> Result<()>;
    async fn read_frame(&mut self) -> Result<VideoFrame>;
    async fn release(&mut self) -> Result<()>;
}

#[async_trait]
impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    async fn connect(&mut self) -> Result<()> {
        (**self).connect().await
    }

    async fn read_frame(&mut self) -> Result<VideoFrame> {
        (**self).read_frame().await
    }

    async fn release(&mut self) -> Result<()> {
        (**self).release().await
    }
}

/// Deterministic generated feed used for development and tests.
///
/// Renders a horizontal/vertical gradient whose red channel advances one step
/// per frame. Never fails; pacing belongs to the sampler.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    tick: u64,
}

impl SyntheticSource {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            tick: 0,
        }
    }

    fn render(&self) -> Vec<u8> {
        let mut data =
            Vec::with_capacity(self.width as usize * self.height as usize * BYTES_PER_PIXEL);
        for y in 0..self.height {
            for x in 0..self.width {
                let blue = ((x * 255) / self.width.max(1)) as u8;
                let green = ((y * 255) / self.height.max(1)) as u8;
                let red = (self.tick % 256) as u8;
                data.extend_from_slice(&[blue, green, red]);
            }
        }
        data
    }
}

#[async_trait]
impl FrameSource for SyntheticSource {
    async fn connect(&mut self) -> Result<()> {
        info!("Starting synthetic source at {}x{}", self.width, self.height);
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<VideoFrame> {
        let frame = VideoFrame::from_bgr(self.width, self.height, self.render())?;
        self.tick += 1;
        Ok(frame)
    }

    async fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Generate an error aligned with capture semantics.
pub fn capture_error(message: impl Into<String>) -> SpectraError {
    SpectraError::Capture(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_types::config::SourceKind;

    fn config(width: u32, height: u32) -> CaptureConfig {
        CaptureConfig {
            source: SourceKind::Synthetic,
            input: String::new(),
            width,
            height,
            ffmpeg_path: None,
        }
    }

    #[tokio::test]
    async fn synthetic_frames_have_expected_dimensions() {
        let mut source = SyntheticSource::new(&config(40, 35));
        source.connect().await.unwrap();
        let frame = source.read_frame().await.unwrap();
        assert_eq!(frame.width(), 40);
        assert_eq!(frame.height(), 35);
        assert_eq!(frame.data().len(), 40 * 35 * BYTES_PER_PIXEL);
    }

    #[tokio::test]
    async fn synthetic_red_channel_advances_per_frame() {
        let mut source = SyntheticSource::new(&config(8, 35));
        let first = source.read_frame().await.unwrap();
        let second = source.read_frame().await.unwrap();
        assert_eq!(first.pixel(0, 0)[2], 0);
        assert_eq!(second.pixel(0, 0)[2], 1);
    }
}
