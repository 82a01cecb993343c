//! JSON document loading.

use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::AssetDescriptor;
use crate::error::AssetError;
use crate::parser::{AssetParser, LoadContext, ParserCaps, ParserPriority};
use crate::value::AssetValue;

/// Loads and parses JSON assets.
#[derive(Debug, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetParser for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    fn priority(&self) -> ParserPriority {
        ParserPriority::Low
    }

    fn capabilities(&self) -> ParserCaps {
        ParserCaps::loader()
    }

    fn test(&self, _url: &str, descriptor: &AssetDescriptor) -> bool {
        descriptor.effective_format().as_deref() == Some("json")
    }

    async fn load(
        &self,
        url: &str,
        _descriptor: &AssetDescriptor,
        ctx: &LoadContext,
    ) -> Result<AssetValue, AssetError> {
        let fetched = ctx.platform.fetch(url).await?;
        let document: serde_json::Value = serde_json::from_slice(&fetched.bytes)?;
        Ok(AssetValue::Json(Arc::new(document)))
    }
}
