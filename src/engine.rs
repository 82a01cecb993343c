//! Engine facade wiring the subsystems together.

use std::sync::Arc;

use parking_lot::Mutex;

use mural_assets::{BackgroundPrefetcher, LoadCoordinator, register_default_parsers};
use mural_config::Config;
use mural_core::{Platform, SurfacePool};
use mural_text::{
    FontCache, GlyphLayoutEngine, LayoutResult, TextError, TextMeasurer, TextStyle,
};

/// One engine instance: a coordinator with the default parsers, its
/// background prefetcher, the shared surface pool, and the text caches.
///
/// All caches are explicit members of this instance — there is no
/// process-global state — so tests and embedders can run isolated engines
/// side by side and `reset()` one without touching another.
pub struct Mural {
    coordinator: LoadCoordinator,
    prefetcher: BackgroundPrefetcher,
    surfaces: Arc<SurfacePool>,
    fonts: Mutex<FontCache>,
    layouts: Mutex<GlyphLayoutEngine>,
}

impl Mural {
    pub fn new(
        platform: Arc<dyn Platform>,
        measurer: Arc<dyn TextMeasurer>,
        config: Config,
    ) -> Self {
        let coordinator = LoadCoordinator::new(Arc::clone(&platform), config.assets.clone());
        register_default_parsers(&coordinator);
        let prefetcher = BackgroundPrefetcher::new(coordinator.clone());
        let surfaces = Arc::new(SurfacePool::new(platform));
        let fonts = Mutex::new(FontCache::new(
            config.text.clone(),
            Arc::clone(&surfaces),
            measurer,
        ));
        let layouts = Mutex::new(GlyphLayoutEngine::new(config.text.layout_cache_size));
        log::info!(
            "mural engine ready: atlas pages {0}x{0}, default load strategy {1:?}",
            config.text.texture_size,
            config.assets.strategy
        );
        Self {
            coordinator,
            prefetcher,
            surfaces,
            fonts,
            layouts,
        }
    }

    /// The foreground load coordinator.
    pub fn coordinator(&self) -> &LoadCoordinator {
        &self.coordinator
    }

    /// The background prefetcher sharing the coordinator's cache.
    pub fn prefetcher(&self) -> &BackgroundPrefetcher {
        &self.prefetcher
    }

    pub fn surfaces(&self) -> &Arc<SurfacePool> {
        &self.surfaces
    }

    /// Lay out bitmap text: resolves (or builds) the dynamic font for the
    /// style, rasterizes any missing glyphs, and computes the line
    /// layout.
    pub fn bitmap_text(
        &self,
        text: &str,
        style: &TextStyle,
        trim_end: bool,
    ) -> Result<Arc<LayoutResult>, TextError> {
        let mut fonts = self.fonts.lock();
        let font = fonts.get_font(text, style)?;
        Ok(self.layouts.lock().get_layout(text, style, font, trim_end))
    }

    /// Number of live dynamic fonts.
    pub fn font_count(&self) -> usize {
        self.fonts.lock().len()
    }

    /// Clear every cache this engine owns. Intended for test isolation.
    pub fn reset(&self) {
        self.coordinator.reset();
        self.fonts.lock().reset();
        self.layouts.lock().reset();
        self.surfaces.reset();
    }
}
