use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use spectra_types::{
    config::CaptureConfig,
    frame::{VideoFrame, BYTES_PER_PIXEL},
    Result,
};
use tokio::{
    io::AsyncReadExt,
    process::{Child, ChildStdout, Command},
};
use tracing::{debug, info, warn};

use crate::{capture_error, FrameSource};

const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Frames pulled from a long-lived ffmpeg child process that decodes the
/// configured device or URL to raw bgr24 on stdout.
///
/// A dead child is torn down on read failure and respawned lazily on the next
/// read, so the sampler's retry loop doubles as stream recovery.
pub struct FfmpegSource {
    config: CaptureConfig,
    ffmpeg_path: PathBuf,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl FfmpegSource {
    pub fn new(config: CaptureConfig) -> Self {
        let ffmpeg_path = config
            .ffmpeg_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG));

        Self {
            config,
            ffmpeg_path,
            child: None,
            stdout: None,
        }
    }

    fn frame_len(&self) -> usize {
        self.config.width as usize * self.config.height as usize * BYTES_PER_PIXEL
    }

    fn spawn_decoder(&mut self) -> Result<()> {
        let scale = format!("scale={}:{}", self.config.width, self.config.height);
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .args(["-i", &self.config.input])
            .arg("-an")
            .args(["-vf", &scale])
            .args(["-f", "rawvideo"])
            .args(["-pix_fmt", "bgr24"])
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|err| {
            capture_error(format!(
                "failed to spawn {}: {err}",
                self.ffmpeg_path.display()
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| capture_error("decoder child has no stdout pipe"))?;

        info!("Decoder started for {}", self.config.input);
        self.child = Some(child);
        self.stdout = Some(stdout);
        Ok(())
    }

    async fn shutdown_decoder(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().await {
                debug!("Decoder child already gone: {err}");
            }
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegSource {
    async fn connect(&mut self) -> Result<()> {
        self.spawn_decoder()
    }

    async fn read_frame(&mut self) -> Result<VideoFrame> {
        if self.stdout.is_none() {
            self.spawn_decoder()?;
        }
        let frame_len = self.frame_len();
        let stdout = match self.stdout.as_mut() {
            Some(stdout) => stdout,
            None => return Err(capture_error("decoder pipe unavailable")),
        };

        let mut data = vec![0u8; frame_len];
        match stdout.read_exact(&mut data).await {
            Ok(_) => VideoFrame::from_bgr(self.config.width, self.config.height, data),
            Err(err) => {
                warn!("Decoder read failed for {}: {err}", self.config.input);
                self.shutdown_decoder().await;
                Err(capture_error(format!(
                    "failed to read frame from {}: {err}",
                    self.config.input
                )))
            }
        }
    }

    async fn release(&mut self) -> Result<()> {
        self.shutdown_decoder().await;
        info!("Decoder released for {}", self.config.input);
        Ok(())
    }
}
