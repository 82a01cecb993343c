//! The host canvas collaborator.
//!
//! A `Surface` is a fixed-size CPU drawing target the glyph-atlas builder
//! rasterizes into. The engine never owns a concrete implementation; hosts
//! inject one through the `Platform` adapter and tests substitute their own.
//!
//! Surfaces are recycled through a process-wide `SurfacePool` keyed by size.
//! A checked-out surface is exclusively owned until it is checked back in,
//! so implementations need no internal synchronization for drawing.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use crate::error::CoreError;
use crate::platform::Platform;

/// Whether a text pass paints glyph interiors or outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawMode {
    Fill,
    Stroke {
        /// Outline width in surface pixels.
        width: f32,
    },
}

/// Drop-shadow parameters for one text pass.
///
/// When present, the implementation first paints an offset (and optionally
/// blurred) copy of the text in the shadow color, then the text itself —
/// the same order an HTML canvas applies `shadowColor`. The atlas builder
/// relies on this to place shadow-only pixels by drawing the text itself
/// off-surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    pub color: [u8; 4],
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
}

/// One text drawing pass.
#[derive(Debug, Clone)]
pub struct TextDrawPass {
    /// Font family hint; hosts with a single font may ignore it.
    pub font_family: String,
    /// Font size in surface pixels.
    pub font_size: f32,
    pub mode: DrawMode,
    /// RGBA color for the fill or stroke.
    pub color: [u8; 4],
    pub shadow: Option<ShadowParams>,
}

/// A fixed-size CPU drawing target.
///
/// `(x, y)` passed to `draw_text` is the top-left corner of the text's em
/// box; the implementation positions the baseline from its own font
/// metrics. Coordinates outside the surface are legal — pixels that land
/// off-surface are discarded, which the shadow technique depends on.
pub trait Surface: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset every pixel to transparent black.
    fn clear(&mut self);

    fn draw_text(&mut self, text: &str, x: f32, y: f32, pass: &TextDrawPass);

    /// Copy the current pixels out, e.g. to finalize a texture page.
    fn snapshot(&self) -> RgbaImage;
}

/// Process-wide pool of drawing surfaces keyed by size.
///
/// Checked-in surfaces are cleared before reuse; a checkout either pops a
/// pooled surface of the exact size or asks the platform for a fresh one.
pub struct SurfacePool {
    platform: Arc<dyn Platform>,
    free: Mutex<HashMap<(u32, u32), Vec<Box<dyn Surface>>>>,
}

impl SurfacePool {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            free: Mutex::new(HashMap::new()),
        }
    }

    /// Check out an exclusively-owned surface of the given size.
    pub fn checkout(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, CoreError> {
        if let Some(surface) = self
            .free
            .lock()
            .get_mut(&(width, height))
            .and_then(Vec::pop)
        {
            log::trace!("surface pool hit for {width}x{height}");
            return Ok(surface);
        }
        self.platform.create_surface(width, height)
    }

    /// Return a surface to the pool for reuse.
    pub fn checkin(&self, mut surface: Box<dyn Surface>) {
        surface.clear();
        let key = (surface.width(), surface.height());
        self.free.lock().entry(key).or_default().push(surface);
    }

    /// Number of surfaces currently idle in the pool.
    pub fn idle_count(&self) -> usize {
        self.free.lock().values().map(Vec::len).sum()
    }

    /// Drop every pooled surface. Intended for test isolation.
    pub fn reset(&self) {
        self.free.lock().clear();
    }
}
