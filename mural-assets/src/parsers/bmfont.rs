//! Bitmap-font descriptor loading.
//!
//! The parser both loads `.fnt` files and participates in the chained
//! parse pass: raw descriptor text loaded by any other parser is
//! recognized by `test_parse` and transformed into a `BitmapFontData`.

use std::sync::Arc;

use async_trait::async_trait;
use mural_text::BitmapFontData;

use crate::descriptor::AssetDescriptor;
use crate::error::AssetError;
use crate::parser::{AssetParser, LoadContext, ParserCaps, ParserPriority};
use crate::value::AssetValue;

/// Loads BMFont text descriptors.
#[derive(Debug, Default)]
pub struct BmFontParser;

impl BmFontParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetParser for BmFontParser {
    fn name(&self) -> &str {
        "bmfont"
    }

    fn priority(&self) -> ParserPriority {
        ParserPriority::Normal
    }

    fn capabilities(&self) -> ParserCaps {
        ParserCaps::loader().with_parse()
    }

    fn test(&self, _url: &str, descriptor: &AssetDescriptor) -> bool {
        descriptor.effective_format().as_deref() == Some("fnt")
    }

    /// Load the raw descriptor text; the chained parse pass below turns
    /// it into font data.
    async fn load(
        &self,
        url: &str,
        _descriptor: &AssetDescriptor,
        ctx: &LoadContext,
    ) -> Result<AssetValue, AssetError> {
        let fetched = ctx.platform.fetch(url).await?;
        let text = String::from_utf8(fetched.bytes)?;
        Ok(AssetValue::from_text(text))
    }

    async fn test_parse(&self, value: &AssetValue, _descriptor: &AssetDescriptor) -> bool {
        value
            .as_text()
            .is_some_and(BitmapFontData::looks_like_text_descriptor)
    }

    async fn parse(
        &self,
        value: AssetValue,
        _descriptor: &AssetDescriptor,
        _ctx: &LoadContext,
    ) -> Result<AssetValue, AssetError> {
        let Some(text) = value.as_text() else {
            return Err(AssetError::UnsupportedValue {
                parser: self.name().to_string(),
                reason: "parse expects raw descriptor text".to_string(),
            });
        };
        let font = BitmapFontData::from_text(text)?;
        Ok(AssetValue::BitmapFont(Arc::new(font)))
    }
}
