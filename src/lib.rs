//! Asset pipeline and dynamic bitmap-text engine for the mural 2D
//! renderer.
//!
//! This crate ties the subsystems together and supplies the native host
//! adapter:
//!
//! - `mural-assets` — parser-pluggable, promise-deduplicated loading with
//!   retry/skip/throw failure policies and background prefetching
//! - `mural-text` — on-demand glyph atlases, font caching, and text layout
//! - `mural-core` — the texture/surface/platform primitives both share
//! - `mural-config` — serde settings with YAML round-trip
//!
//! The `Mural` facade wires a platform adapter, the coordinator with the
//! default parser set, the background prefetcher, and the text caches into
//! one engine handle. `platform::NativePlatform` provides filesystem and
//! HTTP fetching plus a software canvas (fontdue-rasterized when a font is
//! installed, synthetic block glyphs otherwise), so the whole pipeline
//! runs headless.

pub mod engine;
pub mod platform;

pub use engine::Mural;
pub use platform::{FontdueMeasurer, NativePlatform, SoftwareSurface};

// Re-export the subsystem crates under stable names.
pub use mural_assets as assets;
pub use mural_config as config;
pub use mural_core as core_types;
pub use mural_text as text;

// Re-export the types almost every embedder touches.
pub use mural_assets::{
    AssetDescriptor, AssetError, AssetParser, AssetValue, BackgroundPrefetcher,
    LoadCoordinator, LoadOptions,
};
pub use mural_config::Config;
pub use mural_core::{Platform, Surface, SurfacePool, Texture};
pub use mural_text::{FontCache, GlyphLayoutEngine, LayoutResult, TextMeasurer, TextStyle};
