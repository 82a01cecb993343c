//! Asset descriptors and key resolution.
//!
//! A descriptor is the normalized request for one asset. Bare strings
//! convert into a descriptor whose alias list is the source itself.
//! Descriptors are immutable once submitted to the coordinator; the only
//! thing retained beyond the call is the resolved key.

use serde::{Deserialize, Serialize};

/// A normalized request for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Human aliases for the asset; the first is the canonical one.
    pub aliases: Vec<String>,

    /// Source URL or path, possibly relative to the coordinator's base.
    pub src: String,

    /// Opaque payload handed to parsers, e.g. texture hints.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Explicit format override, e.g. `"fnt"`; takes precedence over the
    /// source extension.
    #[serde(default)]
    pub format: Option<String>,

    /// Explicit parser name. When set, parser selection is bypassed; an
    /// unknown name degrades the asset to `None` with a warning.
    #[serde(default)]
    pub parser: Option<String>,

    /// Weight of this asset in batch progress reporting.
    #[serde(default = "default_progress_size")]
    pub progress_size: f32,
}

fn default_progress_size() -> f32 {
    1.0
}

impl AssetDescriptor {
    pub fn new(src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            aliases: vec![src.clone()],
            src,
            data: serde_json::Value::Null,
            format: None,
            parser: None,
            progress_size: default_progress_size(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_progress_size(mut self, progress_size: f32) -> Self {
        self.progress_size = progress_size;
        self
    }

    /// File extension of the source, lowercased, query string ignored.
    /// An explicit `format` wins over the extension.
    pub fn effective_format(&self) -> Option<String> {
        if let Some(format) = &self.format {
            return Some(format.to_ascii_lowercase());
        }
        let path = self.src.split(['?', '#']).next().unwrap_or(&self.src);
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl From<&str> for AssetDescriptor {
    fn from(src: &str) -> Self {
        Self::new(src)
    }
}

impl From<String> for AssetDescriptor {
    fn from(src: String) -> Self {
        Self::new(src)
    }
}

/// Resolve a source to its canonical cache key: absolutized against the
/// base, forward slashes, `.` and `..` segments collapsed. Keys must be
/// canonical so concurrent requests for the same asset share one cache
/// slot regardless of how callers spelled the path.
pub fn resolve_key(src: &str, base: &str) -> String {
    let joined = if src.contains("://") || src.starts_with('/') || base.is_empty() {
        src.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), src)
    };

    let normalized = joined.replace('\\', "/");
    let (prefix, path) = match normalized.find("://") {
        Some(index) => normalized.split_at(index + 3),
        None => ("", normalized.as_str()),
    };

    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|&s| s != "..") {
                    segments.pop();
                } else if !absolute && prefix.is_empty() {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut key = String::from(prefix);
    if absolute {
        key.push('/');
    }
    key.push_str(&segments.join("/"));
    key
}
