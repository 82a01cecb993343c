//! Style-keyed cache of dynamically generated fonts.
//!
//! Fonts are keyed by `TextStyle::atlas_key`: family plus fill key for
//! tintable styles, family plus the full style key once stroke, shadow, or
//! gradient bake color into the atlas. Because glyph geometry lives in
//! measurement space, every point size of a family/style pair shares one
//! font.

use std::collections::HashMap;
use std::sync::Arc;

use mural_config::TextSettings;
use mural_core::SurfacePool;

use crate::atlas::DynamicFont;
use crate::error::TextError;
use crate::measure::TextMeasurer;
use crate::style::TextStyle;

/// Owns every ad-hoc `DynamicFont` in the process.
pub struct FontCache {
    settings: TextSettings,
    pool: Arc<SurfacePool>,
    measurer: Arc<dyn TextMeasurer>,
    fonts: HashMap<String, DynamicFont>,
    warned: bool,
}

impl FontCache {
    pub fn new(
        settings: TextSettings,
        pool: Arc<SurfacePool>,
        measurer: Arc<dyn TextMeasurer>,
    ) -> Self {
        Self {
            settings,
            pool,
            measurer,
            fonts: HashMap::new(),
            warned: false,
        }
    }

    /// Resolve (or create) the font for `style` and make sure every
    /// character of `text` is rasterized in it.
    pub fn get_font(
        &mut self,
        text: &str,
        style: &TextStyle,
    ) -> Result<&mut DynamicFont, TextError> {
        let key = style.atlas_key();
        if !self.fonts.contains_key(&key) {
            log::debug!("creating dynamic font for key '{key}'");
            let font = DynamicFont::new(
                style,
                self.settings.clone(),
                Arc::clone(&self.pool),
                Arc::clone(&self.measurer),
            );
            self.fonts.insert(key.clone(), font);
            if !self.warned && self.fonts.len() > self.settings.max_fonts_warning {
                self.warned = true;
                log::warn!(
                    "{} dynamic fonts are now resident; each one keeps a full \
                     texture atlas alive. Consider installing shared bitmap fonts \
                     for frequently used styles.",
                    self.fonts.len()
                );
            }
        }
        let font = self
            .fonts
            .get_mut(&key)
            .expect("font inserted or present above");
        font.ensure_characters(text)?;
        Ok(font)
    }

    /// Number of live fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Destroy every cached font and release their pages. Intended for
    /// test isolation and teardown.
    pub fn reset(&mut self) {
        for font in self.fonts.values_mut() {
            font.destroy();
        }
        self.fonts.clear();
        self.warned = false;
    }
}
