//! Starter parser set.
//!
//! Registration order follows the priority tiers: specific texture codecs
//! first, engine formats next, generic fallbacks last, so `test`-based
//! selection tries the most specific parser first.

mod bmfont;
mod json;
mod text;
mod texture;

use std::sync::Arc;

pub use bmfont::BmFontParser;
pub use json::JsonParser;
pub use text::TextParser;
pub use texture::TextureParser;

use crate::coordinator::LoadCoordinator;

/// Register the built-in parsers on a coordinator.
pub fn register_default_parsers(coordinator: &LoadCoordinator) {
    coordinator.register_parser(Arc::new(TextureParser::new()));
    coordinator.register_parser(Arc::new(BmFontParser::new()));
    coordinator.register_parser(Arc::new(JsonParser::new()));
    coordinator.register_parser(Arc::new(TextParser::new()));
}
