//! Configuration system for the mural asset pipeline and text engine.
//!
//! This crate provides configuration loading, saving, and default values
//! for the two subsystems:
//!
//! - Asset pipeline settings (failure strategy, retry behavior, decode
//!   worker bound)
//! - Bitmap-text settings (atlas page size, glyph padding, measurement
//!   font size, kerning, cache bounds)

pub mod config;
mod error;

// Re-export main types for convenience
pub use config::{AssetSettings, Config, LoadStrategy, TextSettings};
pub use error::ConfigError;
