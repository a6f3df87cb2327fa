//! Error types for motion_core
//!
//! Motion is cosmetic: almost nothing in the engine is allowed to fail.
//! Bad easing names, malformed descriptors and out-of-range parameters fall
//! back to safe defaults through [`report_fallback`]. The error enum below
//! only covers operations with a real failure mode, such as loading a
//! configuration file.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring the motion engine
#[derive(Error, Debug)]
pub enum MotionError {
    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for the config schema
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for motion_core operations
pub type Result<T> = std::result::Result<T, MotionError>;

/// Report that a configuration value was replaced by a fallback
///
/// Only logs in debug builds; release builds fall back silently.
pub fn report_fallback(kind: &str, given: &str, fallback: &str) {
    if cfg!(debug_assertions) {
        tracing::warn!(kind, given, fallback, "unsupported motion configuration value");
    }
}
