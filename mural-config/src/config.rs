//! Pipeline configuration management.
//!
//! This module provides configuration loading, saving, and default values
//! for the asset pipeline and the bitmap-text engine.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the loader does when an asset fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Wrap the failure with load context and reject that asset.
    #[default]
    Throw,
    /// Report the failure through `on_error` and omit the asset from the
    /// result map.
    Skip,
    /// Clear the cache entry, wait, and reattempt up to `retry_count` times
    /// before behaving like `Throw`.
    Retry,
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    250
}

/// Asset pipeline defaults. Call-site and coordinator-instance options
/// override these per load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Default failure strategy.
    #[serde(default)]
    pub strategy: LoadStrategy,

    /// Retries after the initial attempt under `LoadStrategy::Retry`.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay between retry attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Worker bound for CPU-bound image decode. `0` selects the hardware
    /// parallelism, capped at 4.
    #[serde(default)]
    pub decode_workers: usize,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            strategy: LoadStrategy::default(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            decode_workers: 0,
        }
    }
}

fn default_texture_size() -> u32 {
    512
}

fn default_padding() -> u32 {
    4
}

fn default_measurement_font_size() -> f32 {
    100.0
}

fn default_kerning() -> bool {
    true
}

fn default_max_fonts_warning() -> usize {
    50
}

fn default_layout_cache_size() -> usize {
    1000
}

fn default_font_props_cache_size() -> usize {
    128
}

/// Bitmap-text engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSettings {
    /// Side length of each square atlas page, in texels.
    #[serde(default = "default_texture_size")]
    pub texture_size: u32,

    /// Padding around each glyph's bounding box, in measurement-space
    /// pixels.
    #[serde(default = "default_padding")]
    pub padding: u32,

    /// Internal measurement font size. Glyph geometry is measured once at
    /// this size and scaled to the requested size at draw time.
    #[serde(default = "default_measurement_font_size")]
    pub measurement_font_size: f32,

    /// Whether dynamic fonts compute pairwise kerning adjustments.
    #[serde(default = "default_kerning")]
    pub kerning: bool,

    /// Warn once the font cache holds more ad-hoc fonts than this; each is
    /// a standing GPU-resident atlas.
    #[serde(default = "default_max_fonts_warning")]
    pub max_fonts_warning: usize,

    /// Maximum entries in the text-layout cache.
    #[serde(default = "default_layout_cache_size")]
    pub layout_cache_size: usize,

    /// Maximum entries in the per-font-string metrics cache.
    #[serde(default = "default_font_props_cache_size")]
    pub font_props_cache_size: usize,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            texture_size: default_texture_size(),
            padding: default_padding(),
            measurement_font_size: default_measurement_font_size(),
            kerning: default_kerning(),
            max_fonts_warning: default_max_fonts_warning(),
            layout_cache_size: default_layout_cache_size(),
            font_props_cache_size: default_font_props_cache_size(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetSettings,

    #[serde(default)]
    pub text: TextSettings,
}

impl Config {
    /// Load the configuration, falling back to defaults when no file
    /// exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Load the configuration from an explicit path.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml_ng::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Save the configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path())
    }

    /// Save the configuration to an explicit path.
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
        }
        let yaml = serde_yaml_ng::to_string(self)?;
        fs::write(&path, yaml).map_err(|source| ConfigError::Io { path, source })
    }

    /// Default configuration file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mural")
            .join("config.yaml")
    }
}
