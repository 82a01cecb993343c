//! Typed error types for the asset pipeline.
//!
//! Only load failures escalate to errors; a missing parser or an unknown
//! explicit parser name degrades to a warning and a `None` result at the
//! coordinator level instead.

use std::sync::Arc;

use thiserror::Error;

/// Top-level error type for the asset pipeline.
#[derive(Debug, Error)]
pub enum AssetError {
    // -----------------------------------------------------------------------
    // Load-context wrapper
    // -----------------------------------------------------------------------
    /// A load failed; wraps the underlying error with the failing URL so
    /// batch callers can tell which asset broke. The original error stays
    /// reachable through `source()`.
    #[error("failed to load '{url}': {source}")]
    Load {
        /// Resolved key of the failing asset.
        url: String,
        #[source]
        source: Box<AssetError>,
    },

    // -----------------------------------------------------------------------
    // Transport and decode
    // -----------------------------------------------------------------------
    /// The platform adapter could not fetch the bytes.
    #[error(transparent)]
    Fetch(#[from] mural_core::CoreError),

    /// Fetched bytes are not valid UTF-8 for a text asset.
    #[error("asset is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Fetched bytes are not valid JSON.
    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// An image could not be decoded.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// A bitmap-font descriptor could not be parsed.
    #[error(transparent)]
    BitmapFont(#[from] mural_text::TextError),

    // -----------------------------------------------------------------------
    // Parser contract
    // -----------------------------------------------------------------------
    /// A parser received an asset value it cannot operate on, e.g. a
    /// `parse` pass over the wrong variant.
    #[error("parser '{parser}' cannot handle this asset: {reason}")]
    UnsupportedValue {
        /// Name of the parser involved.
        parser: String,
        reason: String,
    },

    // -----------------------------------------------------------------------
    // Pipeline state
    // -----------------------------------------------------------------------
    /// The in-flight load owning this cache slot went away without
    /// settling, e.g. its task was dropped mid-run.
    #[error("in-flight load for '{0}' was dropped before settling")]
    InFlightDropped(String),

    /// A spawned pipeline task failed to join.
    #[error("pipeline task failed: {0}")]
    WorkerJoin(String),

    /// A previously published failure observed through the shared promise
    /// cache.
    #[error(transparent)]
    Shared(SharedAssetError),
}

/// Clonable wrapper so one failure can be delivered to every waiter of a
/// cache slot.
#[derive(Debug, Clone)]
pub struct SharedAssetError(pub Arc<AssetError>);

impl std::fmt::Display for SharedAssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SharedAssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0.as_ref())
    }
}

impl AssetError {
    /// Wrap an error with the failing URL, once. Re-wrapping an already
    /// wrapped error would bury the context.
    pub fn with_url(self, url: &str) -> AssetError {
        match self {
            already @ AssetError::Load { .. } => already,
            other => AssetError::Load {
                url: url.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Convert a shared failure back into an owned error chain.
    pub fn from_shared(shared: Arc<AssetError>) -> AssetError {
        AssetError::Shared(SharedAssetError(shared))
    }
}
