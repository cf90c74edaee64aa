use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::color::{Hsl, Rgb};
use crate::{Result, SpectraError};

/// Number of horizontal strips sampled from every frame.
pub const ZONE_COUNT: usize = 7;

/// Timestamp format used for CSV export and log-friendly display.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Mean color of one zone in every representation the viewer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneColor {
    /// 1-based zone index, top to bottom.
    pub zone: u8,
    pub rgb: Rgb,
    pub hsl: Hsl,
    pub hex: String,
}

impl ZoneColor {
    pub fn from_rgb(zone: u8, rgb: Rgb) -> Self {
        Self {
            zone,
            hex: rgb.to_hex(),
            hsl: rgb.to_hsl(),
            rgb,
        }
    }
}

/// One sampling cycle: all zone colors plus the cycle's local timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<FixedOffset>,
    pub zones: Vec<ZoneColor>,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<FixedOffset>, zones: Vec<ZoneColor>) -> Result<Self> {
        if zones.len() != ZONE_COUNT {
            return Err(SpectraError::Vision(format!(
                "snapshot requires {ZONE_COUNT} zones, got {}",
                zones.len()
            )));
        }
        Ok(Self { timestamp, zones })
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}
