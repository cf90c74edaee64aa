//! Shared domain types for the Spectra project.

pub mod color;
pub mod config;
pub mod frame;
pub mod snapshot;

mod errors;

pub use errors::{Result, SpectraError};
