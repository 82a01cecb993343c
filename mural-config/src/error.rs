//! Typed error type for configuration IO.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("config IO failed for {path:?}: {source}")]
    Io {
        /// Path of the configuration file involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but is not valid YAML for `Config`.
    #[error("config parse failed for {path:?}: {source}")]
    Parse {
        /// Path of the configuration file involved.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The in-memory configuration could not be serialized.
    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),
}
