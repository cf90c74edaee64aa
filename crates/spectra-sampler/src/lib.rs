//! Background sampling loop coordinating capture, analysis, and publication.

use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use spectra_capture::FrameSource;
use spectra_ops::HistoryStore;
use spectra_types::{
    config::{AnalysisConfig, SamplerConfig},
    snapshot::Snapshot,
    Result, SpectraError,
};
use spectra_vision::ZoneGrid;
use tokio::{
    sync::watch,
    time::{sleep, Duration},
};
use tracing::{error, info, warn};

/// Read side of the sampler's shared state. Values are replaced wholesale
/// each cycle, so readers always see a consistent snapshot. Cheap to clone;
/// the web layer only ever reads.
#[derive(Clone)]
pub struct SamplerFeed {
    frame_rx: watch::Receiver<Option<Arc<Vec<u8>>>>,
    snapshot_rx: watch::Receiver<Option<Snapshot>>,
    history: HistoryStore,
    frame_interval: Duration,
}

impl SamplerFeed {
    /// The latest annotated JPEG, if a frame has been captured yet.
    pub fn latest_jpeg(&self) -> Option<Arc<Vec<u8>>> {
        self.frame_rx.borrow().clone()
    }

    /// The latest zone colors, if a frame has been analyzed yet.
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Target delay between preview frames, mirroring the sampling cadence.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

/// Stops the sampling loop. Stopping does not interrupt a cycle that is
/// already publishing, only pending reads and sleeps.
pub struct SamplerHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl SamplerHandle {
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

pub struct Sampler<S: FrameSource> {
    source: S,
    config: SamplerConfig,
    analysis: AnalysisConfig,
    timezone: FixedOffset,
    frame_tx: watch::Sender<Option<Arc<Vec<u8>>>>,
    snapshot_tx: watch::Sender<Option<Snapshot>>,
    history: HistoryStore,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: FrameSource> Sampler<S> {
    pub fn new(
        source: S,
        config: SamplerConfig,
        analysis: AnalysisConfig,
        history: HistoryStore,
    ) -> Result<(Self, SamplerFeed, SamplerHandle)> {
        let timezone = FixedOffset::east_opt(analysis.timezone_offset_hours * 3600)
            .ok_or_else(|| {
                sampler_error(format!(
                    "invalid timezone offset: {} hours",
                    analysis.timezone_offset_hours
                ))
            })?;

        let (frame_tx, frame_rx) = watch::channel(None);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let feed = SamplerFeed {
            frame_rx,
            snapshot_rx,
            history: history.clone(),
            frame_interval: Duration::from_millis(config.sample_interval_ms),
        };
        let sampler = Self {
            source,
            config,
            analysis,
            timezone,
            frame_tx,
            snapshot_tx,
            history,
            shutdown_rx,
        };
        Ok((sampler, feed, SamplerHandle { shutdown_tx }))
    }

    /// Run until the stop signal fires. Capture failures and per-cycle
    /// analysis errors are logged and retried after the configured delay; the
    /// loop exits only on shutdown.
    pub async fn run(mut self) -> Result<()> {
        if let Err(err) = self.source.connect().await {
            warn!("Source connect failed: {err}; retrying during sampling");
        }
        info!(
            "Sampler started ({}ms cycle, {} snapshot history)",
            self.config.sample_interval_ms, self.config.history_capacity
        );

        let sample_interval = Duration::from_millis(self.config.sample_interval_ms);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);

        while !*self.shutdown_rx.borrow() {
            match self.cycle().await {
                Ok(()) => {
                    if self.pause(sample_interval).await {
                        break;
                    }
                }
                Err(SpectraError::Capture(err)) => {
                    warn!("Failed to capture frame: {err}");
                    if self.pause(retry_delay).await {
                        break;
                    }
                }
                Err(err) => {
                    error!("Error in sampling cycle: {err}");
                    if self.pause(retry_delay).await {
                        break;
                    }
                }
            }
        }

        self.source.release().await?;
        info!("Sampler stopped");
        Ok(())
    }

    async fn cycle(&mut self) -> Result<()> {
        let frame = tokio::select! {
            result = self.source.read_frame() => result?,
            _ = self.shutdown_rx.changed() => return Ok(()),
        };

        let frame = frame.mirrored();
        let grid = ZoneGrid::for_frame(frame.width(), frame.height())?;
        let timestamp = Utc::now().with_timezone(&self.timezone);
        let snapshot = spectra_vision::analyze(&frame, &grid, timestamp)?;
        let annotated = spectra_vision::annotate(&frame, &grid)?;
        let jpeg = spectra_vision::encode_jpeg(&annotated, self.analysis.jpeg_quality)?;

        self.frame_tx.send_replace(Some(Arc::new(jpeg)));
        self.snapshot_tx.send_replace(Some(snapshot.clone()));
        self.history.record(snapshot).await;
        Ok(())
    }

    /// Sleep, racing the shutdown signal. Returns true when shutting down.
    async fn pause(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay) => false,
            _ = self.shutdown_rx.changed() => true,
        }
    }
}

pub fn sampler_error(message: impl Into<String>) -> SpectraError {
    SpectraError::Sampler(message.into())
}
