//! Text layout over dynamic-font glyph metrics.
//!
//! `GlyphLayoutEngine` turns `(text, style, trim_end)` into per-line glyph
//! positions: greedy word wrap, kerning-aware advances, alignment, and
//! justification. Results are pure functions of their inputs and are
//! cached under a composite key; the cache is bounded with oldest-entry
//! eviction.

use std::collections::HashMap;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::atlas::DynamicFont;
use crate::style::{TextAlign, TextStyle};

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    /// Line width in requested-size pixels, after trimming and
    /// justification.
    pub width: f32,
    /// X position of each character's origin.
    pub char_positions: Vec<f32>,
    pub chars: Vec<char>,
    /// Scaled advance of the space character.
    pub space_width: f32,
    /// Indices into `chars` holding spaces, for justification.
    pub space_indices: Vec<usize>,
}

/// Result of laying out one text under one style.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub width: f32,
    pub height: f32,
    /// Measurement-space to requested-size multiplier used throughout.
    pub scale: f32,
    /// Distance from the line top to the baseline, scaled.
    pub offset_y: f32,
    pub lines: Vec<LayoutLine>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct LayoutKey {
    text: String,
    style_key: String,
    trim_end: bool,
}

fn layout_style_key(style: &TextStyle) -> String {
    format!(
        "{}-{}-{}-{:?}-{}-{}",
        style.font_family,
        style.font_size,
        style.style_key(),
        style.align,
        style.word_wrap,
        style.word_wrap_width
    )
}

enum Token<'a> {
    Newline,
    Chunk { text: &'a str, is_space: bool },
}

/// Split text into words, whitespace runs, and explicit newlines.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for segment in text.split_word_bounds() {
        match segment {
            "\n" | "\r" | "\r\n" => tokens.push(Token::Newline),
            _ if segment.chars().all(char::is_whitespace) => tokens.push(Token::Chunk {
                text: segment,
                is_space: true,
            }),
            _ => tokens.push(Token::Chunk {
                text: segment,
                is_space: false,
            }),
        }
    }
    tokens
}

#[derive(Default)]
struct LineBuilder {
    chars: Vec<char>,
    positions: Vec<f32>,
    space_indices: Vec<usize>,
    cursor: f32,
    /// Set when the line was closed by a wrap decision rather than an
    /// explicit newline or the end of the text; justification applies
    /// only to these.
    ended_by_wrap: bool,
}

impl LineBuilder {
    fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn width(&self, letter_spacing: f32) -> f32 {
        if self.chars.is_empty() {
            0.0
        } else {
            (self.cursor - letter_spacing).max(0.0)
        }
    }
}

/// Layout computation and cache.
pub struct GlyphLayoutEngine {
    cache: HashMap<LayoutKey, Arc<LayoutResult>>,
    max_cache_size: usize,
}

impl GlyphLayoutEngine {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            cache: HashMap::new(),
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Fetch or compute the layout for `text` under `style`.
    ///
    /// The font must already contain the text's characters; callers go
    /// through `FontCache::get_font`, which guarantees it. Characters the
    /// font still lacks advance by zero width.
    pub fn get_layout(
        &mut self,
        text: &str,
        style: &TextStyle,
        font: &DynamicFont,
        trim_end: bool,
    ) -> Arc<LayoutResult> {
        let key = LayoutKey {
            text: text.to_string(),
            style_key: layout_style_key(style),
            trim_end,
        };
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached);
        }

        let result = Arc::new(compute_layout(text, style, font, trim_end));

        if self.cache.len() >= self.max_cache_size {
            // Bounded cache: evict an arbitrary old entry.
            if let Some(old) = self.cache.keys().next().cloned() {
                self.cache.remove(&old);
            }
        }
        self.cache.insert(key, Arc::clone(&result));
        result
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Clear the layout cache. Intended for test isolation.
    pub fn reset(&mut self) {
        self.cache.clear();
    }
}

fn scaled_advance(font: &DynamicFont, scale: f32, ch: char) -> f32 {
    match font.glyph(ch) {
        Some(record) => record.x_advance * scale,
        None => {
            log::debug!("layout: no glyph for {ch:?}, advancing zero");
            0.0
        }
    }
}

fn scaled_kerning(font: &DynamicFont, scale: f32, prev: Option<char>, ch: char) -> f32 {
    prev.and_then(|p| font.glyph(p))
        .and_then(|record| record.kerning.get(&ch))
        .map_or(0.0, |k| k * scale)
}

fn chunk_width(font: &DynamicFont, scale: f32, letter_spacing: f32, chunk: &str) -> f32 {
    let mut width = 0.0;
    let mut prev = None;
    for ch in chunk.chars() {
        width += scaled_kerning(font, scale, prev, ch)
            + scaled_advance(font, scale, ch)
            + letter_spacing;
        prev = Some(ch);
    }
    width
}

fn compute_layout(
    text: &str,
    style: &TextStyle,
    font: &DynamicFont,
    trim_end: bool,
) -> LayoutResult {
    let scale = font.scale_for(style.font_size);
    let letter_spacing = style.letter_spacing;
    let line_height = style
        .line_height
        .unwrap_or_else(|| font.line_height() * scale);

    let mut lines: Vec<LineBuilder> = Vec::new();
    let mut line = LineBuilder::default();
    let mut prev_char: Option<char> = None;

    for token in tokenize(text) {
        match token {
            Token::Newline => {
                lines.push(std::mem::take(&mut line));
                prev_char = None;
            }
            Token::Chunk { text: chunk, is_space } => {
                if !is_space
                    && style.word_wrap
                    && !line.is_empty()
                    && line.cursor + chunk_width(font, scale, letter_spacing, chunk)
                        - letter_spacing
                        > style.word_wrap_width
                {
                    // Defer the word to the next line. An overlong word on
                    // an empty line stays put and may overflow.
                    line.ended_by_wrap = true;
                    lines.push(std::mem::take(&mut line));
                    prev_char = None;
                }
                for ch in chunk.chars() {
                    let position = line.cursor + scaled_kerning(font, scale, prev_char, ch);
                    if is_space {
                        line.space_indices.push(line.chars.len());
                    }
                    line.chars.push(ch);
                    line.positions.push(position);
                    line.cursor = position + scaled_advance(font, scale, ch) + letter_spacing;
                    prev_char = Some(ch);
                }
            }
        }
    }
    lines.push(line);

    let space_width = font.glyph(' ').map_or(0.0, |r| r.x_advance * scale);

    let mut laid_out: Vec<LayoutLine> = lines
        .iter()
        .map(|builder| LayoutLine {
            width: builder.width(letter_spacing),
            char_positions: builder.positions.clone(),
            chars: builder.chars.clone(),
            space_width,
            space_indices: builder.space_indices.clone(),
        })
        .collect();

    if trim_end {
        for laid in &mut laid_out {
            trim_trailing_whitespace(laid, font, scale);
        }
    }

    let max_width = laid_out.iter().map(|l| l.width).fold(0.0_f32, f32::max);

    for (index, laid) in laid_out.iter_mut().enumerate() {
        match style.align {
            TextAlign::Left => {}
            TextAlign::Center => {
                let offset = (max_width - laid.width) / 2.0;
                for position in &mut laid.char_positions {
                    *position += offset;
                }
            }
            TextAlign::Right => {
                let offset = max_width - laid.width;
                for position in &mut laid.char_positions {
                    *position += offset;
                }
            }
            TextAlign::Justify => {
                let target = if style.word_wrap {
                    style.word_wrap_width
                } else {
                    max_width
                };
                if lines[index].ended_by_wrap && !laid.space_indices.is_empty() {
                    justify_line(laid, target);
                }
            }
        }
    }

    let width = laid_out.iter().map(|l| l.width).fold(0.0_f32, f32::max);
    let height = laid_out.len() as f32 * line_height;
    let offset_y = font.font_properties().ascent * scale;

    LayoutResult {
        width,
        height,
        scale,
        offset_y,
        lines: laid_out,
    }
}

/// Widen each space boundary by an equal share of the free space, shifting
/// every character behind it.
fn justify_line(line: &mut LayoutLine, target: f32) {
    let free = target - line.width;
    if free <= 0.0 {
        return;
    }
    let extra = free / line.space_indices.len() as f32;
    for (position_index, position) in line.char_positions.iter_mut().enumerate() {
        let crossed = line
            .space_indices
            .iter()
            .filter(|&&space| space < position_index)
            .count();
        *position += extra * crossed as f32;
    }
    line.width = target;
}

/// Remove trailing-whitespace width without removing the characters.
fn trim_trailing_whitespace(line: &mut LayoutLine, font: &DynamicFont, scale: f32) {
    let last_solid = line.chars.iter().rposition(|ch| !ch.is_whitespace());
    match last_solid {
        Some(index) => {
            let advance = font.glyph(line.chars[index]).map_or(0.0, |r| r.x_advance) * scale;
            line.width = line.char_positions[index] + advance;
        }
        None => line.width = 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MonoMeasurer;
    use async_trait::async_trait;
    use image::RgbaImage;
    use mural_config::TextSettings;
    use mural_core::{
        CoreError, FetchedData, Platform, Surface, SurfacePool, TextDrawPass,
    };

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

    /// Font with MonoMeasurer metrics: at a 10px style each glyph
    /// (including the space) advances exactly 6px.
    fn test_font(text: &str) -> DynamicFont {
        let settings = TextSettings {
            kerning: false,
            ..TextSettings::default()
        };
        let mut font = DynamicFont::new(
            &style(),
            settings,
            std::sync::Arc::new(SurfacePool::new(std::sync::Arc::new(NullPlatform))),
            std::sync::Arc::new(MonoMeasurer::default()),
        );
        font.ensure_characters(text).unwrap();
        font
    }

    fn style() -> TextStyle {
        TextStyle {
            font_size: 10.0,
            ..TextStyle::default()
        }
    }

    #[test]
    fn single_line_positions_are_monotonic() {
        let font = test_font("abc");
        let mut engine = GlyphLayoutEngine::new(10);
        let layout = engine.get_layout("abc", &style(), &font, false);
        assert_eq!(layout.lines.len(), 1);
        let line = &layout.lines[0];
        assert_eq!(line.chars, vec!['a', 'b', 'c']);
        assert_eq!(line.char_positions, vec![0.0, 6.0, 12.0]);
        assert!((line.width - 18.0).abs() < 1e-3);
    }

    #[test]
    fn newlines_split_lines() {
        let font = test_font("ab\ncd");
        let mut engine = GlyphLayoutEngine::new(10);
        let layout = engine.get_layout("ab\ncd", &style(), &font, false);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[1].chars, vec!['c', 'd']);
        assert_eq!(layout.lines[1].char_positions[0], 0.0);
    }

    #[test]
    fn word_wrap_defers_words_and_respects_the_width() {
        let text = "A B C D E F G H";
        let font = test_font(text);
        let wrapped = TextStyle {
            word_wrap: true,
            word_wrap_width: 30.0,
            ..style()
        };
        let mut engine = GlyphLayoutEngine::new(10);
        let layout = engine.get_layout(text, &wrapped, &font, true);
        assert!(layout.lines.len() > 1, "narrow width must force wrapping");
        for line in &layout.lines {
            assert!(
                line.width <= 30.0 + 1e-3,
                "line width {} exceeds the wrap width",
                line.width
            );
        }
    }

    #[test]
    fn an_overlong_word_on_an_empty_line_stays() {
        let text = "abcdefgh";
        let font = test_font(text);
        let wrapped = TextStyle {
            word_wrap: true,
            word_wrap_width: 12.0,
            ..style()
        };
        let mut engine = GlyphLayoutEngine::new(10);
        let layout = engine.get_layout(text, &wrapped, &font, false);
        assert_eq!(layout.lines.len(), 1, "unbreakable words never split");
        assert!(layout.lines[0].width > 12.0);
    }

    #[test]
    fn center_alignment_offsets_short_lines() {
        let text = "ab\nabcd";
        let font = test_font(text);
        let centered = TextStyle {
            align: TextAlign::Center,
            ..style()
        };
        let mut engine = GlyphLayoutEngine::new(10);
        let layout = engine.get_layout(text, &centered, &font, false);
        // Long line is 24 wide, short line 12: centered offset is 6.
        assert!((layout.lines[0].char_positions[0] - 6.0).abs() < 1e-3);
        assert_eq!(layout.lines[1].char_positions[0], 0.0);
    }

    #[test]
    fn justify_widens_space_boundaries_on_wrapped_lines() {
        let text = "a b c d";
        let font = test_font(text);
        let justified = TextStyle {
            align: TextAlign::Justify,
            word_wrap: true,
            word_wrap_width: 23.0,
            ..style()
        };
        let mut engine = GlyphLayoutEngine::new(10);
        let layout = engine.get_layout(text, &justified, &font, true);
        assert!(layout.lines.len() >= 2);
        let first = &layout.lines[0];
        // "a b" trims to 18px; the space boundaries absorb the 5px slack.
        assert!((first.width - 23.0).abs() < 1e-3, "width {}", first.width);
        let gap = first.char_positions[2] - first.char_positions[1];
        assert!(gap > 6.0, "character after the space must shift right");
        // The final line is never justified.
        let last = layout.lines.last().unwrap();
        assert!(last.width < 23.0);
    }

    #[test]
    fn trim_end_removes_trailing_width_but_keeps_chars() {
        let text = "ab  ";
        let font = test_font(text);
        let mut engine = GlyphLayoutEngine::new(10);
        let trimmed = engine.get_layout(text, &style(), &font, true);
        let untrimmed = engine.get_layout(text, &style(), &font, false);
        assert_eq!(trimmed.lines[0].chars.len(), 4, "characters stay");
        assert!((trimmed.lines[0].width - 12.0).abs() < 1e-3);
        assert!(untrimmed.lines[0].width > trimmed.lines[0].width);
    }

    #[test]
    fn layouts_are_cached_by_composite_key() {
        let font = test_font("ab");
        let mut engine = GlyphLayoutEngine::new(10);
        let a = engine.get_layout("ab", &style(), &font, false);
        let b = engine.get_layout("ab", &style(), &font, false);
        assert!(Arc::ptr_eq(&a, &b), "identical inputs share one layout");
        let c = engine.get_layout("ab", &style(), &font, true);
        assert!(!Arc::ptr_eq(&a, &c), "trim_end is part of the key");
    }

    #[test]
    fn cache_is_bounded() {
        let font = test_font("abcdefgh");
        let mut engine = GlyphLayoutEngine::new(2);
        engine.get_layout("a", &style(), &font, false);
        engine.get_layout("b", &style(), &font, false);
        engine.get_layout("c", &style(), &font, false);
        assert!(engine.cache_len() <= 2);
    }
}
