//! The host platform adapter.
//!
//! Everything the pipeline needs from its host — fetching bytes, creating
//! drawing surfaces, capability probes — goes through this trait so the
//! engine runs unchanged against native IO, a browser shim, or the mock
//! adapters the test suites inject. Fetching is an asynchronous boundary;
//! control may interleave with other in-flight loads at every await.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::surface::Surface;

/// Raw bytes fetched from a URL or path, with transport metadata.
#[derive(Debug, Clone)]
pub struct FetchedData {
    pub bytes: Vec<u8>,
    /// MIME type reported by the transport, when it has one.
    pub content_type: Option<String>,
}

impl FetchedData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: None,
        }
    }
}

/// Host services injected into the pipeline.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch the raw bytes behind a URL or filesystem path.
    async fn fetch(&self, url: &str) -> Result<FetchedData, CoreError>;

    /// Create a fixed-size drawing surface.
    fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, CoreError>;

    /// Whether the host exposes a font-face registry (web `FontFaceSet` or
    /// an equivalent). Hosts without one degrade gracefully: callers log a
    /// warning and resolve the affected asset to nothing.
    fn supports_font_faces(&self) -> bool {
        false
    }
}
