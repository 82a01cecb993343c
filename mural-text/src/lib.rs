//! Dynamic bitmap-font glyph atlas and text layout for the mural engine.
//!
//! This crate provides:
//! - On-demand glyph rasterization into shelf-packed, multi-page texture
//!   atlases (`DynamicFont`)
//! - A style-keyed cache of generated fonts (`FontCache`)
//! - Line breaking, alignment, and justification over a font's glyph
//!   metrics (`GlyphLayoutEngine`)
//! - The BMFont descriptor data model consumed by the asset loader
//!
//! # Architecture
//!
//! Glyph geometry is measured once at a fixed internal measurement font
//! size and scaled by `requested_size / measurement_size` at draw time, so
//! re-requesting the same family at a different point size never
//! re-measures from scratch. Rasterization goes through the host's
//! `Surface` collaborator; measurement goes through the `TextMeasurer`
//! collaborator, so the whole subsystem runs headless under test.

pub mod atlas;
pub mod bmfont;
mod error;
pub mod font_cache;
pub mod layout;
pub mod measure;
pub mod style;

// Re-export main types for convenience
pub use atlas::{DynamicFont, FontPage, GlyphRecord};
pub use bmfont::{BitmapFontChar, BitmapFontData, BitmapFontPage, DistanceField};
pub use error::TextError;
pub use font_cache::FontCache;
pub use layout::{GlyphLayoutEngine, LayoutLine, LayoutResult};
pub use measure::{FontProperties, FontPropertiesCache, MonoMeasurer, TextMeasurer, TextMetrics};
pub use style::{DropShadowStyle, FillStyle, GradientStop, StrokeStyle, TextAlign, TextStyle};
