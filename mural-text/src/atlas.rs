//! Dynamic bitmap-font glyph atlas.
//!
//! A `DynamicFont` rasterizes glyphs on demand into one or more fixed-size
//! surface pages using shelf packing: glyphs fill the current row left to
//! right, a new row starts when the next padded box would overrun the page
//! width, and a new page is allocated when a fresh row would overrun the
//! page height. All geometry lives in measurement space (the internal
//! measurement font size); consumers scale by
//! `requested_size / measurement_size`.

use std::collections::HashMap;
use std::sync::Arc;

use mural_config::TextSettings;
use mural_core::{
    DrawMode, Rect, ShadowParams, Surface, SurfacePool, TextDrawPass, Texture, TextureSource,
};

use crate::error::TextError;
use crate::measure::{FontProperties, TextMeasurer};
use crate::style::{FillStyle, TextStyle};

/// Whitespace and control characters are measured for advance width but
/// never rasterized and never contribute to row height.
fn is_unrendered(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\t' | ' ')
}

/// Metrics and atlas placement of one rasterized character.
///
/// Immutable once drawn, except for kerning entries added as new
/// neighboring characters are introduced.
#[derive(Debug)]
pub struct GlyphRecord {
    pub code_point: char,
    pub x_offset: f32,
    pub y_offset: f32,
    /// Advance width in measurement space.
    pub x_advance: f32,
    /// Directional kerning adjustments keyed by the following character.
    pub kerning: HashMap<char, f32>,
    /// Sub-rectangle of the owning page, absent for unrendered characters
    /// and after the font is destroyed.
    pub texture: Option<Texture>,
}

/// One rasterization surface and the texture source views share.
pub struct FontPage {
    surface: Option<Box<dyn Surface>>,
    source: Arc<TextureSource>,
}

impl FontPage {
    pub fn source(&self) -> &Arc<TextureSource> {
        &self.source
    }
}

/// A dynamically grown bitmap font.
pub struct DynamicFont {
    font_family: String,
    /// Style normalized to measurement space: measurement font size, zero
    /// letter spacing (spacing must not pollute pair measurements), and
    /// stroke/shadow geometry scaled to match.
    measure_style: TextStyle,
    settings: TextSettings,
    pool: Arc<SurfacePool>,
    measurer: Arc<dyn TextMeasurer>,
    font_properties: FontProperties,
    /// Line height in measurement space.
    line_height: f32,
    pages: Vec<FontPage>,
    chars: HashMap<char, GlyphRecord>,
    current_x: f32,
    current_y: f32,
    max_char_height: f32,
    current_page: usize,
}

impl DynamicFont {
    /// Prepare a font for the given style. No page is allocated until the
    /// first renderable character arrives.
    pub fn new(
        style: &TextStyle,
        settings: TextSettings,
        pool: Arc<SurfacePool>,
        measurer: Arc<dyn TextMeasurer>,
    ) -> Self {
        let ratio = settings.measurement_font_size / style.font_size;
        let mut measure_style = style.clone();
        measure_style.font_size = settings.measurement_font_size;
        measure_style.letter_spacing = 0.0;
        measure_style.line_height = style.line_height.map(|lh| lh * ratio);
        if let Some(stroke) = &mut measure_style.stroke {
            stroke.width *= ratio;
        }
        if let Some(shadow) = &mut measure_style.drop_shadow {
            shadow.offset_x *= ratio;
            shadow.offset_y *= ratio;
            shadow.blur *= ratio;
        }

        let font_properties = measurer.measure_font(&measure_style.font_css());
        let line_height = measure_style
            .line_height
            .unwrap_or(font_properties.ascent + font_properties.descent);

        Self {
            font_family: style.font_family.clone(),
            measure_style,
            settings,
            pool,
            measurer,
            font_properties,
            line_height,
            pages: Vec::new(),
            chars: HashMap::new(),
            current_x: 0.0,
            current_y: 0.0,
            max_char_height: 0.0,
            current_page: 0,
        }
    }

    /// Rasterize every character of `text` that the font does not know
    /// yet. Idempotent: already-drawn characters are filtered out before
    /// any packing work happens.
    pub fn ensure_characters(&mut self, text: &str) -> Result<(), TextError> {
        let mut new_chars: Vec<char> = Vec::new();
        for ch in text.chars() {
            if !self.chars.contains_key(&ch) && !new_chars.contains(&ch) {
                new_chars.push(ch);
            }
        }
        if new_chars.is_empty() {
            return Ok(());
        }

        let padding = self.settings.padding as f32;
        let page_size = self.settings.texture_size as f32;
        let mut drew_any = false;

        for &ch in &new_chars {
            let glyph = ch.to_string();
            let metrics = self.measurer.measure_text(&glyph, &self.measure_style);
            let advance = metrics.width;

            if is_unrendered(ch) {
                self.chars.insert(
                    ch,
                    GlyphRecord {
                        code_point: ch,
                        x_offset: 0.0,
                        y_offset: 0.0,
                        x_advance: advance,
                        kerning: HashMap::new(),
                        texture: None,
                    },
                );
                continue;
            }

            let glyph_height =
                metrics.font_properties.ascent + metrics.font_properties.descent;
            let padded_width = advance + 2.0 * padding;
            let padded_height = glyph_height + 2.0 * padding;

            if self.pages.is_empty() {
                self.allocate_page()?;
            }

            if self.current_x + padded_width > page_size {
                // Start a new shelf row.
                self.current_y += self.max_char_height;
                self.current_x = 0.0;
                self.max_char_height = padded_height;

                if self.current_y + padded_height > page_size {
                    // The fresh row does not fit either: finalize this
                    // page and continue at the top of a new one.
                    self.upload_current_page();
                    self.allocate_page()?;
                    self.current_y = 0.0;
                    self.max_char_height = padded_height;
                }
            } else {
                self.max_char_height = self.max_char_height.max(padded_height);
            }

            self.draw_glyph(&glyph, self.current_x + padding, self.current_y + padding);
            drew_any = true;

            let frame = Rect::new(self.current_x, self.current_y, padded_width, padded_height);
            let texture = Texture::new(
                Arc::clone(self.pages[self.current_page].source()),
                frame,
            );
            self.chars.insert(
                ch,
                GlyphRecord {
                    code_point: ch,
                    x_offset: 0.0,
                    y_offset: 0.0,
                    x_advance: advance,
                    kerning: HashMap::new(),
                    texture: Some(texture),
                },
            );

            self.current_x += padded_width.ceil();
        }

        if self.settings.kerning {
            self.compute_kerning(&new_chars);
        }
        if drew_any {
            self.upload_current_page();
        }
        Ok(())
    }

    /// Draw one glyph at the given measurement-space position on the
    /// active page.
    ///
    /// Pass order is a contract: an optional shadow-only pass first, then
    /// stroke, then fill. The shadow pass draws the text one full page
    /// height above the surface with the shadow offset shifted down by the
    /// same amount, so only the shadow lands on the page and the later
    /// stroke/fill passes are not double-shadowed.
    fn draw_glyph(&mut self, glyph: &str, x: f32, y: f32) {
        let page_height = self.settings.texture_size as f32;
        let family = self.measure_style.font_family.clone();
        let size = self.measure_style.font_size;
        let fill_color = match &self.measure_style.fill {
            FillStyle::Color(color) => *color,
            FillStyle::LinearGradient { stops } => {
                stops.first().map_or([255, 255, 255, 255], |s| s.color)
            }
        };
        let stroke = self.measure_style.stroke;
        let shadow = self.measure_style.drop_shadow;
        let surface = self.pages[self.current_page]
            .surface
            .as_mut()
            .expect("active page always has a live surface");

        if let Some(shadow) = shadow {
            let pass = TextDrawPass {
                font_family: family.clone(),
                font_size: size,
                mode: DrawMode::Fill,
                color: fill_color,
                shadow: Some(ShadowParams {
                    color: shadow.color,
                    offset_x: shadow.offset_x,
                    offset_y: shadow.offset_y + page_height,
                    blur: shadow.blur,
                }),
            };
            surface.draw_text(glyph, x, y - page_height, &pass);
        }

        if let Some(stroke) = stroke {
            let pass = TextDrawPass {
                font_family: family.clone(),
                font_size: size,
                mode: DrawMode::Stroke {
                    width: stroke.width,
                },
                color: stroke.color,
                shadow: None,
            };
            surface.draw_text(glyph, x, y, &pass);
        }

        let pass = TextDrawPass {
            font_family: family,
            font_size: size,
            mode: DrawMode::Fill,
            color: fill_color,
            shadow: None,
        };
        surface.draw_text(glyph, x, y, &pass);
    }

    /// Compute kerning for every new character against every known one,
    /// in both directions. Pairs that already carry an adjustment are
    /// never re-measured.
    fn compute_kerning(&mut self, new_chars: &[char]) {
        let known: Vec<char> = self.chars.keys().copied().collect();
        for &ch in new_chars {
            for &other in &known {
                self.store_kerning(other, ch);
                self.store_kerning(ch, other);
            }
        }
    }

    fn store_kerning(&mut self, first: char, second: char) {
        if first == second {
            return;
        }
        let known = self
            .chars
            .get(&first)
            .is_some_and(|r| r.kerning.contains_key(&second));
        if known {
            return;
        }
        let (Some(w_first), Some(w_second)) = (
            self.chars.get(&first).map(|r| r.x_advance),
            self.chars.get(&second).map(|r| r.x_advance),
        ) else {
            return;
        };
        let pair = format!("{first}{second}");
        let pair_width = self
            .measurer
            .measure_text(&pair, &self.measure_style)
            .width;
        let delta = pair_width - (w_first + w_second);
        if delta != 0.0
            && let Some(record) = self.chars.get_mut(&first)
        {
            record.kerning.insert(second, delta);
        }
    }

    fn allocate_page(&mut self) -> Result<(), TextError> {
        let size = self.settings.texture_size;
        let surface = self.pool.checkout(size, size)?;
        let label = format!("{}-page-{}", self.font_family, self.pages.len());
        log::debug!("allocating glyph atlas page '{label}' ({size}x{size})");
        self.pages.push(FontPage {
            surface: Some(surface),
            source: Arc::new(TextureSource::new(label, size, size)),
        });
        self.current_page = self.pages.len() - 1;
        self.current_x = 0.0;
        Ok(())
    }

    /// Snapshot the active page's pixels into its texture source — the
    /// CPU analogue of a GPU upload.
    fn upload_current_page(&mut self) {
        if let Some(page) = self.pages.get_mut(self.current_page)
            && let Some(surface) = page.surface.as_ref()
        {
            page.source.set_pixels(surface.snapshot());
        }
    }

    /// Release every page surface back to the pool and detach all glyph
    /// textures.
    pub fn destroy(&mut self) {
        for page in &mut self.pages {
            if let Some(surface) = page.surface.take() {
                self.pool.checkin(surface);
            }
            page.source.release_pixels();
        }
        self.pages.clear();
        self.chars.clear();
        self.current_x = 0.0;
        self.current_y = 0.0;
        self.max_char_height = 0.0;
        self.current_page = 0;
    }

    pub fn chars(&self) -> &HashMap<char, GlyphRecord> {
        &self.chars
    }

    pub fn glyph(&self, ch: char) -> Option<&GlyphRecord> {
        self.chars.get(&ch)
    }

    pub fn pages(&self) -> &[FontPage] {
        &self.pages
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_properties(&self) -> FontProperties {
        self.font_properties
    }

    /// Line height in measurement space.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn measurement_font_size(&self) -> f32 {
        self.settings.measurement_font_size
    }

    /// Scale multiplier from measurement space to a requested size.
    pub fn scale_for(&self, font_size: f32) -> f32 {
        font_size / self.settings.measurement_font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MonoMeasurer;
    use async_trait::async_trait;
    use image::RgbaImage;
    use mural_core::{CoreError, FetchedData, Platform};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSurface {
        width: u32,
        height: u32,
        draws: Arc<AtomicUsize>,
    }

    impl Surface for CountingSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn clear(&mut self) {}

        fn draw_text(&mut self, _text: &str, _x: f32, _y: f32, _pass: &TextDrawPass) {
            self.draws.fetch_add(1, Ordering::SeqCst);
        }

        fn snapshot(&self) -> RgbaImage {
            RgbaImage::new(self.width, self.height)
        }
    }

    struct CountingPlatform {
        draws: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Platform for CountingPlatform {
        async fn fetch(&self, url: &str) -> Result<FetchedData, CoreError> {
            Err(CoreError::UnsupportedScheme(url.to_string()))
        }

        fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, CoreError> {
            Ok(Box::new(CountingSurface {
                width,
                height,
                draws: Arc::clone(&self.draws),
            }))
        }
    }

    fn test_font(settings: TextSettings) -> (DynamicFont, Arc<AtomicUsize>) {
        let draws = Arc::new(AtomicUsize::new(0));
        let pool = Arc::new(SurfacePool::new(Arc::new(CountingPlatform {
            draws: Arc::clone(&draws),
        })));
        let font = DynamicFont::new(
            &TextStyle {
                font_size: 10.0,
                ..TextStyle::default()
            },
            settings,
            pool,
            Arc::new(MonoMeasurer::default()),
        );
        (font, draws)
    }

    fn small_settings() -> TextSettings {
        TextSettings {
            // MonoMeasurer at measurement size 100 gives 60-wide glyphs;
            // padded 68. Three fit a 220-wide row, the page holds two rows.
            texture_size: 220,
            padding: 4,
            measurement_font_size: 100.0,
            kerning: false,
            ..TextSettings::default()
        }
    }

    #[test]
    fn no_page_is_allocated_for_whitespace_only() {
        let (mut font, _) = test_font(small_settings());
        font.ensure_characters(" \n\t\r").unwrap();
        assert!(font.pages().is_empty(), "whitespace never rasterizes");
        assert!(font.glyph(' ').unwrap().x_advance > 0.0);
        assert!(font.glyph(' ').unwrap().texture.is_none());
    }

    #[test]
    fn ensure_characters_is_idempotent() {
        let (mut font, draws) = test_font(small_settings());
        font.ensure_characters("abc").unwrap();
        let after_first = draws.load(Ordering::SeqCst);
        assert!(after_first > 0);

        font.ensure_characters("abc").unwrap();
        assert_eq!(
            draws.load(Ordering::SeqCst),
            after_first,
            "second ensure must not rasterize again"
        );
    }

    #[test]
    fn row_overflow_starts_a_new_shelf_on_the_same_page() {
        let (mut font, _) = test_font(small_settings());
        // Three glyphs fill the first row; the fourth starts a new row.
        font.ensure_characters("abcd").unwrap();
        assert_eq!(font.pages().len(), 1);
        let d = font.glyph('d').unwrap().texture.as_ref().unwrap();
        assert_eq!(d.frame().x, 0.0, "new row restarts at the left edge");
        assert!(d.frame().y > 0.0, "new row sits below the first");
    }

    #[test]
    fn page_overflow_allocates_a_new_page() {
        let (mut font, _) = test_font(small_settings());
        // Two rows of three glyphs fill page one; the seventh glyph needs
        // a third row, which no longer fits the 220-texel page height.
        font.ensure_characters("abcdefg").unwrap();
        assert_eq!(font.pages().len(), 2, "third shelf must open page two");
        let g = font.glyph('g').unwrap().texture.as_ref().unwrap();
        assert_eq!(g.frame().x, 0.0);
        assert_eq!(g.frame().y, 0.0, "new page restarts the cursor");
    }

    #[test]
    fn destroy_returns_surfaces_and_detaches_textures() {
        let (mut font, _) = test_font(small_settings());
        font.ensure_characters("ab").unwrap();
        let pool = Arc::clone(&font.pool);
        assert_eq!(pool.idle_count(), 0);

        font.destroy();
        assert_eq!(pool.idle_count(), 1, "page surface returns to the pool");
        assert!(font.chars().is_empty());
        assert!(font.pages().is_empty());
    }
}
