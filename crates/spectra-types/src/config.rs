use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, SpectraError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Deterministic generated frames, no external process.
    Synthetic,
    /// Long-lived ffmpeg child decoding the configured device or URL.
    Ffmpeg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub source: SourceKind,
    /// Device path or stream URL handed to ffmpeg.
    pub input: String,
    pub width: u32,
    pub height: u32,
    pub ffmpeg_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub sample_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub jpeg_quality: u8,
    /// Fixed UTC offset applied to snapshot timestamps.
    pub timezone_offset_hours: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectraConfig {
    pub capture: CaptureConfig,
    pub sampler: SamplerConfig,
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
    pub ops: OpsConfig,
}

impl SpectraConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            SpectraError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            SpectraError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.width < 5 || self.capture.height < 35 {
            return Err(SpectraError::Configuration(
                "capture resolution must be at least 5x35 to fit the zone band".into(),
            ));
        }
        if self.sampler.sample_interval_ms == 0 {
            return Err(SpectraError::Configuration(
                "sampler.sample_interval_ms must be greater than zero".into(),
            ));
        }
        if self.sampler.retry_delay_ms == 0 {
            return Err(SpectraError::Configuration(
                "sampler.retry_delay_ms must be greater than zero".into(),
            ));
        }
        if self.sampler.history_capacity == 0 {
            return Err(SpectraError::Configuration(
                "sampler.history_capacity must be greater than zero".into(),
            ));
        }
        if !(1..=100).contains(&self.analysis.jpeg_quality) {
            return Err(SpectraError::Configuration(
                "analysis.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if !(-12..=14).contains(&self.analysis.timezone_offset_hours) {
            return Err(SpectraError::Configuration(
                "analysis.timezone_offset_hours must be a real UTC offset (-12..=14)".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(SpectraError::Configuration(
                "server.port must be a valid port (>0)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_config() -> SpectraConfig {
        SpectraConfig {
            capture: CaptureConfig {
                source: SourceKind::Ffmpeg,
                input: "rtsp://127.0.0.1:554/stream".into(),
                width: 640,
                height: 480,
                ffmpeg_path: None,
            },
            sampler: SamplerConfig {
                sample_interval_ms: 33,
                retry_delay_ms: 1000,
                history_capacity: 1000,
            },
            analysis: AnalysisConfig {
                jpeg_quality: 80,
                timezone_offset_hours: 7,
            },
            server: ServerConfig {
                bind_addr: "0.0.0.0".into(),
                port: 3000,
            },
            ops: OpsConfig {
                log_level: "info".into(),
            },
        }
    }

    #[test]
    fn load_spectra_config_from_file() {
        let temp_path = std::env::temp_dir().join("spectra-config-test.toml");
        let config = sample_config();

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = SpectraConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded.capture.source, SourceKind::Ffmpeg);
        assert_eq!(loaded.capture.input, config.capture.input);
        assert_eq!(loaded.sampler.history_capacity, 1000);
        assert_eq!(loaded.analysis.timezone_offset_hours, 7);
        assert_eq!(loaded.server.port, config.server.port);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());

        config.capture.height = 34;
        assert!(config.validate().is_err());
        config.capture.height = 480;
        config.sampler.sample_interval_ms = 0;
        assert!(config.validate().is_err());
        config.sampler.sample_interval_ms = 33;
        config.sampler.history_capacity = 0;
        assert!(config.validate().is_err());
        config.sampler.history_capacity = 1000;
        config.analysis.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.analysis.jpeg_quality = 101;
        assert!(config.validate().is_err());
        config.analysis.jpeg_quality = 80;
        config.analysis.timezone_offset_hours = 20;
        assert!(config.validate().is_err());
        config.analysis.timezone_offset_hours = 7;
        config.server.port = 0;
        assert!(config.validate().is_err());
        config.server.port = 3000;
        assert!(config.validate().is_ok());
    }
}
