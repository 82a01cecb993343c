//! Text styling.
//!
//! `TextStyle` is the input to measurement, rasterization, and layout. Two
//! derived keys matter for caching: the fill key (enough when a style is
//! tintable, i.e. a single atlas can be recolored per draw) and the full
//! style key (required once stroke, shadow, or gradient bake color into
//! the glyph pixels).

use serde::{Deserialize, Serialize};

/// Horizontal alignment of laid-out lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// One stop of a gradient fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient axis, 0..=1.
    pub offset: f32,
    pub color: [u8; 4],
}

/// Glyph interior paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillStyle {
    Color([u8; 4]),
    /// A vertical gradient. Gradient fills bake color into the atlas, so
    /// they are never tintable.
    LinearGradient { stops: Vec<GradientStop> },
}

/// Glyph outline paint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: [u8; 4],
    pub width: f32,
}

/// Drop shadow behind the glyph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropShadowStyle {
    pub color: [u8; 4],
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
}

/// Style input for bitmap text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_family: String,

    /// Requested rendering size in pixels. Glyph geometry is measured at
    /// the internal measurement size and scaled, so this never forces a
    /// re-rasterization on its own.
    pub font_size: f32,

    pub fill: FillStyle,

    pub stroke: Option<StrokeStyle>,

    pub drop_shadow: Option<DropShadowStyle>,

    /// Extra advance between consecutive characters, in pixels at the
    /// requested size.
    pub letter_spacing: f32,

    /// Explicit line height; measured line height is used when absent.
    pub line_height: Option<f32>,

    pub align: TextAlign,

    pub word_wrap: bool,

    /// Wrap width in pixels, used when `word_wrap` is set and as the
    /// justification target.
    pub word_wrap_width: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 26.0,
            fill: FillStyle::Color([0, 0, 0, 255]),
            stroke: None,
            drop_shadow: None,
            letter_spacing: 0.0,
            line_height: None,
            align: TextAlign::Left,
            word_wrap: false,
            word_wrap_width: 100.0,
        }
    }
}

fn color_key(color: [u8; 4]) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        color[0], color[1], color[2], color[3]
    )
}

impl TextStyle {
    /// CSS-style font string, the key unit for font-metrics caching.
    pub fn font_css(&self) -> String {
        format!("{}px {}", self.font_size, self.font_family)
    }

    /// Key covering only the fill paint.
    pub fn fill_key(&self) -> String {
        match &self.fill {
            FillStyle::Color(color) => color_key(*color),
            FillStyle::LinearGradient { stops } => {
                let mut key = String::from("grad");
                for stop in stops {
                    key.push_str(&format!("-{}@{}", color_key(stop.color), stop.offset));
                }
                key
            }
        }
    }

    /// Key covering every property baked into glyph pixels. The font size
    /// is deliberately excluded: geometry lives in measurement space and
    /// size is a pure scale multiplier.
    pub fn style_key(&self) -> String {
        let mut key = self.fill_key();
        if let Some(stroke) = &self.stroke {
            key.push_str(&format!("-s{}w{}", color_key(stroke.color), stroke.width));
        }
        if let Some(shadow) = &self.drop_shadow {
            key.push_str(&format!(
                "-d{}o{},{}b{}",
                color_key(shadow.color),
                shadow.offset_x,
                shadow.offset_y,
                shadow.blur
            ));
        }
        key.push_str(&format!("-ls{}", self.letter_spacing));
        key
    }

    /// Whether one white-glyph atlas can serve every color of this style.
    /// Stroke, shadow, and gradient all bake color into the pixels and
    /// force a per-style atlas instead.
    pub fn is_tintable(&self) -> bool {
        matches!(self.fill, FillStyle::Color(_))
            && self.stroke.is_none()
            && self.drop_shadow.is_none()
    }

    /// Cache key for the dynamic-font cache: family plus the fill key for
    /// tintable styles, family plus the full style key otherwise. The two
    /// branches are mutually exclusive.
    pub fn atlas_key(&self) -> String {
        if self.is_tintable() {
            format!("{}-{}", self.font_family, self.fill_key())
        } else {
            format!("{}-{}", self.font_family, self.style_key())
        }
    }
}
