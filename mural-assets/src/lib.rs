//! Asset loading pipeline for the mural 2D rendering engine.
//!
//! This crate provides:
//! - `LoadCoordinator` — parser-pluggable, promise-deduplicated asset
//!   loading with per-asset `throw`/`skip`/`retry` failure policies
//! - `ParserRegistry` — an ordered, lazily validated collection of
//!   pluggable parsers
//! - `BackgroundPrefetcher` — a low-priority sequential prefetcher that
//!   shares the coordinator's promise cache and therefore never duplicates
//!   foreground work
//! - A starter parser set (raw text, JSON, textures, BMFont descriptors)
//!
//! # Architecture
//!
//! Every load resolves its source to a canonical key and consults the
//! promise cache first: at most one load per key is ever in flight, and
//! all concurrent requesters share the same `Arc`-backed result. Parser
//! selection walks the registry in registration order; after a parser's
//! `load`, every registered parser gets a `test_parse` pass over the
//! result, so a second parser can transform an already-loaded raw asset
//! (raw descriptor text into a bitmap font, for example).

pub mod background;
pub mod cache;
pub mod coordinator;
mod decode;
pub mod descriptor;
mod error;
pub mod options;
pub mod parser;
pub mod parsers;
pub mod registry;
pub mod value;

// Re-export main types for convenience
pub use background::BackgroundPrefetcher;
pub use cache::PromiseCache;
pub use coordinator::LoadCoordinator;
pub use decode::DecodePool;
pub use descriptor::{AssetDescriptor, resolve_key};
pub use error::AssetError;
pub use options::{ErrorFn, LoadOptions, ProgressFn};
pub use parser::{AssetParser, LoadContext, ParserCaps, ParserPriority};
pub use parsers::{
    BmFontParser, JsonParser, TextParser, TextureParser, register_default_parsers,
};
pub use registry::ParserRegistry;
pub use value::{AssetValue, LoadedAsset};
