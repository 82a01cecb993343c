//! BMFont descriptor data model and text-format parser.
//!
//! The asset loader consumes pre-rendered bitmap fonts described by the
//! BMFont format: `info`, `common`, `page`, `char`, and `kerning` blocks,
//! with an optional `distanceField` block for SDF/MSDF fonts. Only the
//! line-oriented text form is parsed here; the XML form carries the same
//! data and is delegated to the host's XML facilities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TextError;

/// One texture page referenced by a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapFontPage {
    pub id: u32,
    /// Path of the page image, relative to the descriptor.
    pub file: String,
}

/// Placement and metrics of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BitmapFontChar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
    pub page: u32,
    /// Kerning adjustments keyed by the following character.
    #[serde(default)]
    pub kerning: HashMap<char, f32>,
}

/// Distance-field parameters for SDF/MSDF fonts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceField {
    /// Field type, e.g. `"sdf"` or `"msdf"`.
    pub kind: String,
    pub range: f32,
}

/// Parsed BMFont descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapFontData {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
    /// Distance from the line top to the glyph baseline.
    pub base_line_offset: f32,
    pub pages: Vec<BitmapFontPage>,
    pub chars: HashMap<char, BitmapFontChar>,
    pub distance_field: Option<DistanceField>,
}

/// Split a descriptor line's attribute list into key/value pairs,
/// honoring double-quoted values.
fn parse_attributes(rest: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let bytes = rest.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            // Bare token without a value; skip it.
            continue;
        }
        let key = rest[key_start..i].to_string();
        i += 1;
        let value = if i < bytes.len() && bytes[i] == b'"' {
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            let value = rest[value_start..i].to_string();
            i = (i + 1).min(bytes.len());
            value
        } else {
            let value_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            rest[value_start..i].to_string()
        };
        attrs.insert(key, value);
    }
    attrs
}

fn attr_f32(
    attrs: &HashMap<String, String>,
    key: &str,
    line: usize,
) -> Result<f32, TextError> {
    attrs
        .get(key)
        .and_then(|v| v.parse::<f32>().ok())
        .ok_or_else(|| TextError::BmFontParse {
            line,
            message: format!("missing or non-numeric attribute '{key}'"),
        })
}

fn attr_u32(
    attrs: &HashMap<String, String>,
    key: &str,
    line: usize,
) -> Result<u32, TextError> {
    attrs
        .get(key)
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| TextError::BmFontParse {
            line,
            message: format!("missing or non-numeric attribute '{key}'"),
        })
}

impl BitmapFontData {
    /// Cheap sniff used by the loader's parse chain to recognize a raw
    /// text asset as a BMFont descriptor.
    pub fn looks_like_text_descriptor(text: &str) -> bool {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        matches!(lines.next(), Some(first) if first.starts_with("info "))
    }

    /// Parse the BMFont text format.
    pub fn from_text(text: &str) -> Result<Self, TextError> {
        let mut font_family = None;
        let mut font_size = None;
        let mut common: Option<(f32, f32)> = None;
        let mut pages = Vec::new();
        let mut chars: HashMap<char, BitmapFontChar> = HashMap::new();
        let mut pending_kernings: Vec<(char, char, f32)> = Vec::new();
        let mut distance_field = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let (tag, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let attrs = parse_attributes(rest);
            match tag {
                "info" => {
                    font_family = attrs.get("face").cloned();
                    font_size = Some(attr_f32(&attrs, "size", line_no)?.abs());
                }
                "common" => {
                    common = Some((
                        attr_f32(&attrs, "lineHeight", line_no)?,
                        attr_f32(&attrs, "base", line_no)?,
                    ));
                }
                "page" => {
                    pages.push(BitmapFontPage {
                        id: attr_u32(&attrs, "id", line_no)?,
                        file: attrs.get("file").cloned().ok_or_else(|| {
                            TextError::BmFontParse {
                                line: line_no,
                                message: "page is missing 'file'".to_string(),
                            }
                        })?,
                    });
                }
                "char" => {
                    let id = attr_u32(&attrs, "id", line_no)?;
                    let Some(letter) = char::from_u32(id) else {
                        log::warn!("BMFont char id {id} is not a valid code point, skipping");
                        continue;
                    };
                    chars.insert(
                        letter,
                        BitmapFontChar {
                            x: attr_f32(&attrs, "x", line_no)?,
                            y: attr_f32(&attrs, "y", line_no)?,
                            width: attr_f32(&attrs, "width", line_no)?,
                            height: attr_f32(&attrs, "height", line_no)?,
                            x_offset: attr_f32(&attrs, "xoffset", line_no).unwrap_or(0.0),
                            y_offset: attr_f32(&attrs, "yoffset", line_no).unwrap_or(0.0),
                            x_advance: attr_f32(&attrs, "xadvance", line_no)?,
                            page: attr_u32(&attrs, "page", line_no).unwrap_or(0),
                            kerning: HashMap::new(),
                        },
                    );
                }
                "kerning" => {
                    let first = attr_u32(&attrs, "first", line_no)?;
                    let second = attr_u32(&attrs, "second", line_no)?;
                    let amount = attr_f32(&attrs, "amount", line_no)?;
                    if let (Some(a), Some(b)) = (char::from_u32(first), char::from_u32(second)) {
                        pending_kernings.push((a, b, amount));
                    }
                }
                "distanceField" => {
                    distance_field = Some(DistanceField {
                        kind: attrs.get("fieldType").cloned().unwrap_or_default(),
                        range: attr_f32(&attrs, "distanceRange", line_no)?,
                    });
                }
                // Block headers with only a count, and unknown blocks.
                "chars" | "kernings" => {}
                other => {
                    log::debug!("BMFont: ignoring unknown block '{other}' at line {line_no}");
                }
            }
        }

        let font_size = font_size.ok_or(TextError::BmFontIncomplete("info"))?;
        let (line_height, base_line_offset) =
            common.ok_or(TextError::BmFontIncomplete("common"))?;

        for (first, second, amount) in pending_kernings {
            match chars.get_mut(&first) {
                Some(record) => {
                    record.kerning.insert(second, amount);
                }
                None => {
                    log::warn!(
                        "BMFont kerning references unknown char {:?}, skipping",
                        first
                    );
                }
            }
        }

        Ok(Self {
            font_family: font_family.unwrap_or_default(),
            font_size,
            line_height,
            base_line_offset,
            pages,
            chars,
            distance_field,
        })
    }
}
