//! Integration tests for the dynamic bitmap-font subsystem.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use parking_lot::Mutex;

use mural_config::TextSettings;
use mural_core::{
    CoreError, FetchedData, Platform, Surface, SurfacePool, TextDrawPass,
};
use mural_text::{
    DynamicFont, FontCache, FontProperties, GlyphLayoutEngine, MonoMeasurer, TextMeasurer,
    TextMetrics, TextStyle,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct NullSurface(u32, u32);

impl Surface for NullSurface {
    fn width(&self) -> u32 {
        self.0
    }

    fn height(&self) -> u32 {
        self.1
    }

    fn clear(&mut self) {}

    fn draw_text(&mut self, _text: &str, _x: f32, _y: f32, _pass: &TextDrawPass) {}

    fn snapshot(&self) -> RgbaImage {
        RgbaImage::new(self.0, self.1)
    }
}

struct NullPlatform;

#[async_trait]
impl Platform for NullPlatform {
    async fn fetch(&self, url: &str) -> Result<FetchedData, CoreError> {
        Err(CoreError::UnsupportedScheme(url.to_string()))
    }

    fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, CoreError> {
        Ok(Box::new(NullSurface(width, height)))
    }
}

/// Fixed-advance measurer with per-pair width overrides, so kerning is
/// nonzero and direction-dependent.
struct PairMeasurer {
    base: MonoMeasurer,
    pair_widths: HashMap<&'static str, f32>,
    pair_measures: Mutex<Vec<String>>,
}

impl PairMeasurer {
    fn new(pair_widths: HashMap<&'static str, f32>) -> Self {
        Self {
            base: MonoMeasurer::default(),
            pair_widths,
            pair_measures: Mutex::new(Vec::new()),
        }
    }
}

impl TextMeasurer for PairMeasurer {
    fn measure_text(&self, text: &str, style: &TextStyle) -> TextMetrics {
        if text.chars().count() == 2 {
            self.pair_measures.lock().push(text.to_string());
        }
        let mut metrics = self.base.measure_text(text, style);
        if let Some(width) = self.pair_widths.get(text) {
            metrics.width = *width;
        }
        metrics
    }

    fn measure_font(&self, font_css: &str) -> FontProperties {
        self.base.measure_font(font_css)
    }
}

fn pool() -> Arc<SurfacePool> {
    Arc::new(SurfacePool::new(Arc::new(NullPlatform)))
}

fn style() -> TextStyle {
    TextStyle {
        font_size: 10.0,
        ..TextStyle::default()
    }
}

// ---------------------------------------------------------------------------
// Kerning
// ---------------------------------------------------------------------------

#[test]
fn kerning_is_directional_and_matches_pair_measurements() {
    // Measurement space: each glyph is 60 wide. "AV" measures 110 and
    // "VA" measures 115, so the two directions carry different deltas.
    let measurer = Arc::new(PairMeasurer::new(HashMap::from([
        ("AV", 110.0_f32),
        ("VA", 115.0_f32),
    ])));
    let settings = TextSettings::default();
    let mut font = DynamicFont::new(&style(), settings, pool(), Arc::clone(&measurer) as _);

    font.ensure_characters("AV").unwrap();

    let a_to_v = font.glyph('A').unwrap().kerning[&'V'];
    let v_to_a = font.glyph('V').unwrap().kerning[&'A'];
    assert!((a_to_v - (110.0 - 120.0)).abs() < 1e-3, "A→V is {a_to_v}");
    assert!((v_to_a - (115.0 - 120.0)).abs() < 1e-3, "V→A is {v_to_a}");
    assert_ne!(
        a_to_v, v_to_a,
        "kerning symmetry must not be assumed between directions"
    );
}

#[test]
fn measured_pairs_are_never_recomputed() {
    let measurer = Arc::new(PairMeasurer::new(HashMap::from([("AV", 110.0_f32)])));
    let settings = TextSettings::default();
    let mut font = DynamicFont::new(&style(), settings, pool(), Arc::clone(&measurer) as _);

    font.ensure_characters("AV").unwrap();
    let av_measures = |log: &Vec<String>| log.iter().filter(|p| p.as_str() == "AV").count();
    let before = av_measures(&measurer.pair_measures.lock());
    assert!(before >= 1);

    // New characters trigger a kerning pass against the known set, but
    // the already-measured A→V pair must not be touched again.
    font.ensure_characters("X").unwrap();
    let after = av_measures(&measurer.pair_measures.lock());
    assert_eq!(before, after, "stored pairs are skipped on later passes");
}

// ---------------------------------------------------------------------------
// FontCache + layout end to end
// ---------------------------------------------------------------------------

#[test]
fn cache_layout_roundtrip_produces_kerned_positions() {
    let measurer = Arc::new(PairMeasurer::new(HashMap::from([("AV", 110.0_f32)])));
    let mut cache = FontCache::new(TextSettings::default(), pool(), measurer as _);
    let style = style();

    let font = cache.get_font("AV", &style).unwrap();
    let mut engine = GlyphLayoutEngine::new(16);
    let layout = engine.get_layout("AV", &style, font, false);

    // At 10px the advance is 6 and the A→V kerning is -1.
    let line = &layout.lines[0];
    assert_eq!(line.chars, vec!['A', 'V']);
    assert!((line.char_positions[0]).abs() < 1e-3);
    assert!(
        (line.char_positions[1] - 5.0).abs() < 1e-3,
        "V should sit at 6 - 1 = 5, got {}",
        line.char_positions[1]
    );
}

#[test]
fn glyph_textures_survive_repeated_ensure_calls() {
    let mut cache = FontCache::new(
        TextSettings {
            kerning: false,
            ..TextSettings::default()
        },
        pool(),
        Arc::new(MonoMeasurer::default()),
    );
    let style = style();

    let font = cache.get_font("abc", &style).unwrap();
    let frame_before = font.glyph('a').unwrap().texture.as_ref().unwrap().frame();
    let pages_before = font.pages().len();

    let font = cache.get_font("abc", &style).unwrap();
    let frame_after = font.glyph('a').unwrap().texture.as_ref().unwrap().frame();
    assert_eq!(frame_before, frame_after, "textures must be stable");
    assert_eq!(font.pages().len(), pages_before);
}

#[test]
fn page_sources_receive_pixels_after_rasterization() {
    let mut cache = FontCache::new(
        TextSettings {
            kerning: false,
            ..TextSettings::default()
        },
        pool(),
        Arc::new(MonoMeasurer::default()),
    );
    let font = cache.get_font("abc", &style()).unwrap();
    assert_eq!(font.pages().len(), 1);
    assert!(
        font.pages()[0].source().has_pixels(),
        "the active page must be uploaded after ensure_characters"
    );
}
