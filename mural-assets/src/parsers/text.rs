//! Raw UTF-8 text loading.

use async_trait::async_trait;

use crate::descriptor::AssetDescriptor;
use crate::error::AssetError;
use crate::parser::{AssetParser, LoadContext, ParserCaps, ParserPriority};
use crate::value::AssetValue;

const FORMATS: &[&str] = &["txt", "text"];

/// Loads plain-text assets.
#[derive(Debug, Default)]
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetParser for TextParser {
    fn name(&self) -> &str {
        "text"
    }

    fn priority(&self) -> ParserPriority {
        ParserPriority::Low
    }

    fn capabilities(&self) -> ParserCaps {
        ParserCaps::loader()
    }

    fn test(&self, _url: &str, descriptor: &AssetDescriptor) -> bool {
        descriptor
            .effective_format()
            .is_some_and(|format| FORMATS.contains(&format.as_str()))
    }

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
}
