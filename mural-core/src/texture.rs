//! CPU-side texture handles.
//!
//! A `TextureSource` owns (or lazily holds) the pixel storage for one
//! rasterization surface or decoded image; a `Texture` is a lightweight
//! sub-rectangle view into a source. Clones of a `Texture` share the same
//! `Arc`-backed source, so every consumer of a cached asset observes the
//! identical object.

use std::sync::Arc;

use image::RgbaImage;
use parking_lot::RwLock;

/// An axis-aligned rectangle in texel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Pixel storage behind one or more `Texture` views.
///
/// The pixel buffer is optional: a source is created with its final
/// dimensions up front, and the pixels arrive later when a surface is
/// finalized (the CPU analogue of a GPU upload). `release_pixels` drops the
/// buffer on unload while the handle itself stays valid for bookkeeping.
#[derive(Debug)]
pub struct TextureSource {
    label: String,
    width: u32,
    height: u32,
    pixels: RwLock<Option<RgbaImage>>,
}

impl TextureSource {
    /// Create an empty source with fixed dimensions.
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            pixels: RwLock::new(None),
        }
    }

    /// Create a source from an already-decoded image.
    pub fn from_image(label: impl Into<String>, image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            label: label.into(),
            width,
            height,
            pixels: RwLock::new(Some(image)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Replace the pixel buffer. Called when a surface snapshot is taken.
    pub fn set_pixels(&self, image: RgbaImage) {
        *self.pixels.write() = Some(image);
    }

    /// Run `f` against the current pixel buffer, if any.
    pub fn with_pixels<R>(&self, f: impl FnOnce(Option<&RgbaImage>) -> R) -> R {
        f(self.pixels.read().as_ref())
    }

    pub fn has_pixels(&self) -> bool {
        self.pixels.read().is_some()
    }

    /// Drop the pixel buffer, e.g. on asset unload.
    pub fn release_pixels(&self) {
        *self.pixels.write() = None;
    }
}

/// A sub-rectangle view of a `TextureSource`.
#[derive(Debug, Clone)]
pub struct Texture {
    source: Arc<TextureSource>,
    frame: Rect,
}

impl Texture {
    pub fn new(source: Arc<TextureSource>, frame: Rect) -> Self {
        Self { source, frame }
    }

    /// A texture covering the whole source.
    pub fn from_source(source: Arc<TextureSource>) -> Self {
        let frame = Rect::new(0.0, 0.0, source.width() as f32, source.height() as f32);
        Self { source, frame }
    }

    pub fn source(&self) -> &Arc<TextureSource> {
        &self.source
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn width(&self) -> f32 {
        self.frame.width
    }

    pub fn height(&self) -> f32 {
        self.frame.height
    }

    /// Whether two textures share the same underlying source allocation.
    pub fn same_source(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}
