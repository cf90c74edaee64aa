use thiserror::Error;

pub type Result<T, E = SpectraError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum SpectraError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("capture error: {0}")]
    Capture(String),
    #[error("vision error: {0}")]
    Vision(String),
    #[error("sampler error: {0}")]
    Sampler(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
