//! The canvas text-measurement collaborator.
//!
//! Measurement is host-provided: a browser shim backs this with a canvas
//! context, the native platform backs it with a rasterizer's metrics, and
//! the deterministic `MonoMeasurer` keeps everything runnable headless.
//! Per-font-string metrics are cached in an LRU keyed by the CSS font
//! string, since `measure_font` is the expensive call hosts tend to make
//! repeatedly for the same font.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::style::TextStyle;

/// Vertical metrics for one font string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontProperties {
    pub ascent: f32,
    pub descent: f32,
    pub font_size: f32,
}

/// Result of measuring a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    pub line_height: f32,
    pub font_properties: FontProperties,
}

/// Host-injected text measurement.
pub trait TextMeasurer: Send + Sync {
    /// Measure a single run of text (no newlines) under a style.
    fn measure_text(&self, text: &str, style: &TextStyle) -> TextMetrics;

    /// Measure the vertical properties of a CSS font string such as
    /// `"100px sans-serif"`.
    fn measure_font(&self, font_css: &str) -> FontProperties;
}

/// LRU cache of `FontProperties` keyed by CSS font string.
pub struct FontPropertiesCache {
    inner: Mutex<LruCache<String, FontProperties>>,
}

impl FontPropertiesCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch cached properties or measure and remember them.
    pub fn get_or_measure(
        &self,
        measurer: &dyn TextMeasurer,
        font_css: &str,
    ) -> FontProperties {
        let mut cache = self.inner.lock();
        if let Some(props) = cache.get(font_css) {
            return *props;
        }
        let props = measurer.measure_font(font_css);
        cache.put(font_css.to_string(), props);
        props
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Clear the cache. Intended for test isolation.
    pub fn reset(&self) {
        self.inner.lock().clear();
    }
}

/// Deterministic fixed-advance measurer.
///
/// Every glyph advances `advance_ratio * font_size`; ascent and descent
/// are fixed ratios of the size. This is the measurement analogue of an
/// embedded fallback font: always available, host independent, and exact
/// enough for packing, layout, and tests.
#[derive(Debug, Clone, Copy)]
pub struct MonoMeasurer {
    pub advance_ratio: f32,
    pub ascent_ratio: f32,
    pub descent_ratio: f32,
}

impl Default for MonoMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            ascent_ratio: 0.8,
            descent_ratio: 0.2,
        }
    }
}

impl MonoMeasurer {
    fn size_from_css(font_css: &str) -> f32 {
        font_css
            .split("px")
            .next()
            .and_then(|s| s.trim().parse::<f32>().ok())
            .unwrap_or(16.0)
    }
}

impl TextMeasurer for MonoMeasurer {
    fn measure_text(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let size = style.font_size;
        let count = text.chars().count();
        let spacing = style.letter_spacing * count.saturating_sub(1) as f32;
        let width = self.advance_ratio * size * count as f32 + spacing;
        let font_properties = self.measure_font(&style.font_css());
        let line_height = style
            .line_height
            .unwrap_or(font_properties.ascent + font_properties.descent);
        TextMetrics {
            width,
            height: line_height,
            line_height,
            font_properties,
        }
    }

    fn measure_font(&self, font_css: &str) -> FontProperties {
        let size = Self::size_from_css(font_css);
        FontProperties {
            ascent: self.ascent_ratio * size,
            descent: self.descent_ratio * size,
            font_size: size,
        }
    }
}
