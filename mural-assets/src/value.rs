//! Loaded asset values.
//!
//! Every variant is `Arc`-backed (directly or through its inner handle),
//! so clones taken out of the promise cache are reference-identical views
//! of one allocation — the dedup guarantee callers rely on.

use std::sync::Arc;

use mural_core::Texture;
use mural_text::BitmapFontData;

/// A loaded, possibly parser-transformed asset.
#[derive(Debug, Clone)]
pub enum AssetValue {
    /// Raw bytes nothing has interpreted yet.
    Bytes(Arc<Vec<u8>>),
    /// Decoded UTF-8 text.
    Text(Arc<str>),
    /// Parsed JSON document.
    Json(Arc<serde_json::Value>),
    /// Decoded texture.
    Texture(Texture),
    /// Parsed bitmap-font descriptor.
    BitmapFont(Arc<BitmapFontData>),
}

impl AssetValue {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Bytes(Arc::new(bytes))
    }

    pub fn from_text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(json) => Some(json),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            Self::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_bitmap_font(&self) -> Option<&Arc<BitmapFontData>> {
        match self {
            Self::BitmapFont(font) => Some(font),
            _ => None,
        }
    }

    /// Whether two values are views of the same allocation.
    pub fn same_allocation(&self, other: &AssetValue) -> bool {
        match (self, other) {
            (Self::Bytes(a), Self::Bytes(b)) => Arc::ptr_eq(a, b),
            (Self::Text(a), Self::Text(b)) => Arc::ptr_eq(a, b),
            (Self::Json(a), Self::Json(b)) => Arc::ptr_eq(a, b),
            (Self::Texture(a), Self::Texture(b)) => a.same_source(b),
            (Self::BitmapFont(a), Self::BitmapFont(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A settled cache entry: the value (absent when no parser matched) plus
/// the parser that produced it, for `unload` dispatch.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub value: Option<AssetValue>,
    /// Name of the parser whose `load` produced the value.
    pub parser: Option<String>,
}

impl LoadedAsset {
    pub fn none() -> Self {
        Self {
            value: None,
            parser: None,
        }
    }
}
