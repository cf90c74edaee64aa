use std::{env, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use spectra_capture::{FfmpegSource, FrameSource, SyntheticSource};
use spectra_ops::{init_tracing, HistoryStore};
use spectra_sampler::Sampler;
use spectra_types::config::{
    AnalysisConfig, CaptureConfig, OpsConfig, SamplerConfig, ServerConfig, SourceKind,
    SpectraConfig,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "spectra-server", about = "Live video zone-color monitoring service")]
struct Cli {
    /// Path to a TOML config file; SPECTRA_CONFIG is used when omitted.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config);
    init_tracing(&config.ops)?;

    let history = HistoryStore::new(config.sampler.history_capacity);
    let source: Box<dyn FrameSource> = match config.capture.source {
        SourceKind::Synthetic => Box::new(SyntheticSource::new(&config.capture)),
        SourceKind::Ffmpeg => Box::new(FfmpegSource::new(config.capture.clone())),
    };

    let (sampler, feed, handle) = Sampler::new(
        source,
        config.sampler.clone(),
        config.analysis.clone(),
        history,
    )?;
    let sampler_task = tokio::spawn(sampler.run());

    tokio::select! {
        result = spectra_web::serve(config.server.clone(), feed) => result?,
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received; shutting down"),
    }

    handle.stop();
    sampler_task.await??;
    Ok(())
}

fn load_config(cli_path: Option<PathBuf>) -> SpectraConfig {
    let from_env = env::var("SPECTRA_CONFIG").ok().map(PathBuf::from);
    let path = cli_path
        .or(from_env)
        .unwrap_or_else(|| PathBuf::from("configs/dev.toml"));
    match SpectraConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                default_config()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path.display()
            );
            default_config()
        }
    }
}

fn default_config() -> SpectraConfig {
    let config = SpectraConfig {
        capture: CaptureConfig {
            source: SourceKind::Synthetic,
            input: "/dev/video0".into(),
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
    };
    debug_assert!(config.validate().is_ok());
    config
}
