//! Typed error types for mural-core.
//!
//! This module provides structured error types so callers at the crate
//! boundary can match on specific error variants instead of relying on
//! opaque `anyhow` strings.

use thiserror::Error;

/// Top-level error type for the core primitives and the platform adapter.
#[derive(Debug, Error)]
pub enum CoreError {
    // -----------------------------------------------------------------------
    // Platform adapter
    // -----------------------------------------------------------------------
    /// The underlying fetch (filesystem read or HTTP request) failed.
    #[error("fetch failed for '{url}': {source}")]
    Fetch {
        /// The URL or path that could not be fetched.
        url: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The URL scheme is not one the platform adapter knows how to fetch.
    #[error("unsupported URL scheme in '{0}'")]
    UnsupportedScheme(String),

    /// A drawing surface could not be created.
    #[error("surface creation failed ({width}x{height}): {reason}")]
    SurfaceCreation {
        /// Requested surface width in pixels.
        width: u32,
        /// Requested surface height in pixels.
        height: u32,
        /// Human-readable failure reason from the host.
        reason: String,
    },

    // -----------------------------------------------------------------------
    // Capability probes
    // -----------------------------------------------------------------------
    /// The host lacks a capability the caller asked for.
    #[error("unsupported capability: {0}")]
    Unsupported(String),
}
