//! Operational helpers: logging setup and the bounded color history.

use std::{collections::VecDeque, sync::Arc};

use spectra_types::{config::OpsConfig, snapshot::Snapshot, Result, SpectraError};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Header row of the history export.
pub const CSV_HEADER: &str = "Timestamp,Zone,RGB,HSL,HEX";

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| SpectraError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| SpectraError::Ops(format!("tracing init error: {err}")))?;
    info!("Logging initialized ({})", config.log_level);
    Ok(())
}

/// Bounded FIFO history of sampling snapshots.
///
/// Appending at capacity evicts the oldest entry; insert and evict are both
/// O(1) on the underlying ring buffer.
#[derive(Clone)]
pub struct HistoryStore {
    snapshots: Arc<Mutex<VecDeque<Snapshot>>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn record(&self, snapshot: Snapshot) {
        let mut snapshots = self.snapshots.lock().await;
        if snapshots.len() == self.capacity {
            snapshots.pop_front();
        }
        snapshots.push_back(snapshot);
    }

    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.lock().await.is_empty()
    }

    /// Oldest-first copy of the full history.
    pub async fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().await.iter().cloned().collect()
    }

    /// Render the full history as CSV, one row per (snapshot, zone) pair.
    /// RGB and HSL cells are quoted tuples so the column count stays five.
    pub async fn to_csv(&self) -> String {
        let snapshots = self.snapshots.lock().await;
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for snapshot in snapshots.iter() {
            let timestamp = snapshot.formatted_timestamp();
            for zone in &snapshot.zones {
                out.push_str(&format!(
                    "{timestamp},{},\"{}\",\"{}\",{}\n",
                    zone.zone, zone.rgb, zone.hsl, zone.hex
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use spectra_types::{
        color::Rgb,
        snapshot::{ZoneColor, ZONE_COUNT},
    };

    fn snapshot(second: u32, red: u8) -> Snapshot {
        let timestamp = FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 4, 12, 0, second)
            .unwrap();
        let zones = (1..=ZONE_COUNT as u8)
            .map(|i| ZoneColor::from_rgb(i, Rgb(red, 0, 0)))
            .collect();
        Snapshot::new(timestamp, zones).unwrap()
    }

    #[tokio::test]
    async fn history_evicts_oldest_at_capacity() {
        let store = HistoryStore::new(3);
        for i in 0..4 {
            store.record(snapshot(i, i as u8)).await;
        }
        let snapshots = store.snapshots().await;
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].zones[0].rgb, Rgb(1, 0, 0));
        assert_eq!(snapshots[2].zones[0].rgb, Rgb(3, 0, 0));
    }

    #[tokio::test]
    async fn history_never_exceeds_capacity() {
        let store = HistoryStore::new(10);
        for i in 0..25 {
            store.record(snapshot(i % 60, 0)).await;
            assert!(store.len().await <= 10);
        }
        assert_eq!(store.len().await, 10);
    }

    #[tokio::test]
    async fn csv_has_header_and_seven_rows_per_snapshot() {
        let store = HistoryStore::new(100);
        store.record(snapshot(1, 255)).await;
        store.record(snapshot(2, 0)).await;

        let csv = store.to_csv().await;
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Timestamp,Zone,RGB,HSL,HEX");
        assert_eq!(lines.len(), 1 + 2 * ZONE_COUNT);
        assert_eq!(
            lines[1],
            "2024-05-04 12:00:01,1,\"(255, 0, 0)\",\"(0, 100, 50)\",#ff0000"
        );
    }

    #[tokio::test]
    async fn empty_history_exports_header_only() {
        let store = HistoryStore::new(5);
        assert!(store.is_empty().await);
        assert_eq!(store.to_csv().await, "Timestamp,Zone,RGB,HSL,HEX\n");
    }
}
