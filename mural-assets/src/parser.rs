//! The pluggable parser contract.
//!
//! A parser is a capability bundle: it declares exactly which operations
//! it implements through `ParserCaps`, and the coordinator consults that
//! declaration instead of probing for behavior. Arbitrary third-party
//! parsers may be registered; the set is not a closed enum.

use std::sync::Arc;

use async_trait::async_trait;
use mural_core::Platform;

use crate::decode::DecodePool;
use crate::descriptor::AssetDescriptor;
use crate::error::AssetError;
use crate::value::AssetValue;

/// Ordinal priority tier of a parser.
///
/// Tiers influence the recommended registration order (specific
/// high-priority codecs before generic fallbacks); selection itself always
/// walks the registry in registration order, never a runtime sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParserPriority {
    /// Generic formats: text, JSON, web fonts.
    Low,
    /// Engine-specific generic formats.
    Normal,
    /// Specific texture codecs.
    High,
}

/// Explicit capability set of a parser.
///
/// Replaces duck-typed "does the object have a `load` property" probing:
/// the coordinator only calls operations a parser has declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserCaps {
    pub test: bool,
    pub load: bool,
    pub test_parse: bool,
    pub parse: bool,
    pub unload: bool,
}

impl ParserCaps {
    /// A plain loader: `test` + `load`.
    pub const fn loader() -> Self {
        Self {
            test: true,
            load: true,
            test_parse: false,
            parse: false,
            unload: false,
        }
    }

    pub const fn with_parse(mut self) -> Self {
        self.test_parse = true;
        self.parse = true;
        self
    }

    pub const fn with_unload(mut self) -> Self {
        self.unload = true;
        self
    }

    /// Eligible for parser selection: both `load` and a `test` predicate.
    pub const fn selectable(&self) -> bool {
        self.test && self.load
    }

    /// Eligible for the chained parse pass.
    pub const fn chainable(&self) -> bool {
        self.test_parse && self.parse
    }
}

/// Host services available to a parser during `load`/`parse`.
#[derive(Clone)]
pub struct LoadContext {
    pub platform: Arc<dyn Platform>,
    /// Bounded worker pool for CPU-bound image decode.
    pub decode: Arc<DecodePool>,
}

/// A pluggable asset parser.
///
/// Implement only the operations declared in `capabilities()`; the
/// defaults for the rest are inert. `load` fetches and produces a value;
/// `parse` transforms a value another parser already loaded (the raw
/// descriptor text → bitmap font chain); `unload` releases resources when
/// the coordinator evicts the asset.
#[async_trait]
pub trait AssetParser: Send + Sync {
    /// Unique name within a registry. Registration warns on conflicts.
    fn name(&self) -> &str;

    fn priority(&self) -> ParserPriority {
        ParserPriority::Normal
    }

    fn capabilities(&self) -> ParserCaps;

    /// Whether this parser wants to `load` the given source.
    fn test(&self, _url: &str, _descriptor: &AssetDescriptor) -> bool {
        false
    }

    async fn load(
        &self,
        _url: &str,
        _descriptor: &AssetDescriptor,
        _ctx: &LoadContext,
    ) -> Result<AssetValue, AssetError> {
        Err(AssetError::UnsupportedValue {
            parser: self.name().to_string(),
            reason: "parser does not implement load".to_string(),
        })
    }

    /// Whether this parser wants a `parse` pass over an already-loaded
    /// value.
    async fn test_parse(&self, _value: &AssetValue, _descriptor: &AssetDescriptor) -> bool {
        false
    }

    async fn parse(
        &self,
        value: AssetValue,
        _descriptor: &AssetDescriptor,
        _ctx: &LoadContext,
    ) -> Result<AssetValue, AssetError> {
        Ok(value)
    }

    async fn unload(&self, _value: &AssetValue, _descriptor: &AssetDescriptor) {}
}
