//! Native host adapter.
//!
//! Fetching covers filesystem paths and HTTP(S) URLs (blocking `ureq`
//! requests moved off the async executor). Surfaces are software canvases:
//! glyphs rasterize through `fontdue` when a font is installed, and fall
//! back to synthetic block glyphs otherwise so the atlas pipeline stays
//! exercisable on hosts with no fonts at all.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

use mural_core::{
    CoreError, DrawMode, FetchedData, Platform, Surface, TextDrawPass,
};
use mural_text::{FontProperties, MonoMeasurer, TextMeasurer, TextMetrics, TextStyle};

/// HTTP agent configured with native-tls and the platform's root
/// certificates.
fn http_agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .build()
        .into()
}

/// Native platform: filesystem + HTTP fetch, software surfaces.
pub struct NativePlatform {
    agent: Agent,
    font: Option<Arc<fontdue::Font>>,
}

impl NativePlatform {
    /// A platform with no installed font; surfaces draw synthetic block
    /// glyphs and measurement falls back to fixed advances.
    pub fn new() -> Self {
        Self {
            agent: http_agent(),
            font: None,
        }
    }

    /// Install a TTF/OTF font for real rasterization and metrics.
    pub fn with_font_bytes(bytes: Vec<u8>) -> anyhow::Result<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow::anyhow!("font load failed: {e}"))?;
        Ok(Self {
            agent: http_agent(),
            font: Some(Arc::new(font)),
        })
    }

    pub fn with_font_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .with_context(|| format!("failed to read font file {:?}", path.as_ref()))?;
        Self::with_font_bytes(bytes)
    }

    /// The text measurer matching this platform's surfaces.
    pub fn measurer(&self) -> Arc<dyn TextMeasurer> {
        match &self.font {
            Some(font) => Arc::new(FontdueMeasurer::new(Arc::clone(font))),
            None => Arc::new(MonoMeasurer::default()),
        }
    }

    fn fetch_http(agent: &Agent, url: &str) -> Result<FetchedData, CoreError> {
        let mut response = agent.get(url).call().map_err(|e| CoreError::Fetch {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| CoreError::Fetch {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        Ok(FetchedData {
            bytes,
            content_type,
        })
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for NativePlatform {
    async fn fetch(&self, url: &str) -> Result<FetchedData, CoreError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let agent = self.agent.clone();
            let url = url.to_string();
            return tokio::task::spawn_blocking(move || Self::fetch_http(&agent, &url))
                .await
                .map_err(|e| CoreError::Fetch {
                    url: "<http task>".to_string(),
                    source: Box::new(e),
                })?;
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        let bytes = tokio::fs::read(path).await.map_err(|e| CoreError::Fetch {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        Ok(FetchedData::new(bytes))
    }

    fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::SurfaceCreation {
                width,
                height,
                reason: "surfaces must have a nonzero size".to_string(),
            });
        }
        Ok(Box::new(SoftwareSurface::new(
            width,
            height,
            self.font.clone(),
        )))
    }
}

/// Source-over blend of a coverage value in `color` onto one pixel.
fn blend_pixel(pixel: &mut Rgba<u8>, color: [u8; 4], coverage: u8) {
    if coverage == 0 {
        return;
    }
    let alpha = (coverage as u32 * color[3] as u32) / 255;
    if alpha == 0 {
        return;
    }
    let inverse = 255 - alpha;
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = pixel.0[channel] as u32;
        pixel.0[channel] = ((src * alpha + dst * inverse) / 255) as u8;
    }
    let dst_alpha = pixel.0[3] as u32;
    pixel.0[3] = (alpha + (dst_alpha * inverse) / 255).min(255) as u8;
}

/// A CPU canvas backed by an RGBA image.
pub struct SoftwareSurface {
    image: RgbaImage,
    font: Option<Arc<fontdue::Font>>,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32, font: Option<Arc<fontdue::Font>>) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            font,
        }
    }

    /// Blit a coverage bitmap with its top-left at `(x, y)`. Pixels that
    /// land outside the surface are discarded, which the atlas builder's
    /// off-surface shadow pass depends on.
    fn blit_coverage(
        &mut self,
        coverage: &[u8],
        cov_width: usize,
        cov_height: usize,
        x: f32,
        y: f32,
        color: [u8; 4],
    ) {
        let (width, height) = self.image.dimensions();
        let origin_x = x.round() as i64;
        let origin_y = y.round() as i64;
        for row in 0..cov_height {
            let target_y = origin_y + row as i64;
            if target_y < 0 || target_y >= height as i64 {
                continue;
            }
            for col in 0..cov_width {
                let target_x = origin_x + col as i64;
                if target_x < 0 || target_x >= width as i64 {
                    continue;
                }
                let pixel = self.image.get_pixel_mut(target_x as u32, target_y as u32);
                blend_pixel(pixel, color, coverage[row * cov_width + col]);
            }
        }
    }

    /// Rasterize one glyph's coverage. Falls back to a solid block for
    /// fontless surfaces.
    fn glyph_coverage(&self, ch: char, px: f32) -> (Vec<u8>, usize, usize, f32, f32, f32) {
        if let Some(font) = &self.font {
            let (metrics, coverage) = font.rasterize(ch, px);
            let ascent = font
                .horizontal_line_metrics(px)
                .map_or(0.8 * px, |m| m.ascent);
            // Glyph top relative to the em-box top.
            let top = ascent - (metrics.height as f32 + metrics.ymin as f32);
            return (
                coverage,
                metrics.width,
                metrics.height,
                metrics.xmin as f32,
                top,
                metrics.advance_width,
            );
        }
        // Synthetic block glyph: matches MonoMeasurer's fixed ratios.
        let advance = 0.6 * px;
        let block_width = (advance * 0.8).max(1.0) as usize;
        let block_height = (0.7 * px).max(1.0) as usize;
        (
            vec![255; block_width * block_height],
            block_width,
            block_height,
            advance * 0.1,
            0.1 * px,
            advance,
        )
    }

    fn draw_pass(&mut self, text: &str, x: f32, y: f32, pass: &TextDrawPass, color: [u8; 4]) {
        let mut pen_x = x;
        for ch in text.chars() {
            if ch.is_whitespace() {
                let advance = self
                    .font
                    .as_ref()
                    .map_or(0.6 * pass.font_size, |f| {
                        f.metrics(ch, pass.font_size).advance_width
                    });
                pen_x += advance;
                continue;
            }
            let (coverage, cov_width, cov_height, bearing, top, advance) =
                self.glyph_coverage(ch, pass.font_size);
            match pass.mode {
                DrawMode::Fill => {
                    self.blit_coverage(
                        &coverage, cov_width, cov_height,
                        pen_x + bearing,
                        y + top,
                        color,
                    );
                }
                DrawMode::Stroke { width } => {
                    // Cheap outline: stamp the coverage at eight offsets
                    // of the stroke radius.
                    let radius = (width * 0.5).max(1.0);
                    for (dx, dy) in [
                        (-radius, 0.0),
                        (radius, 0.0),
                        (0.0, -radius),
                        (0.0, radius),
                        (-radius, -radius),
                        (radius, -radius),
                        (-radius, radius),
                        (radius, radius),
                    ] {
                        self.blit_coverage(
                            &coverage, cov_width, cov_height,
                            pen_x + bearing + dx,
                            y + top + dy,
                            color,
                        );
                    }
                }
            }
            pen_x += advance;
        }
    }
}

impl Surface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, pass: &TextDrawPass) {
        // Canvas shadow semantics: the offset shadow copy first, then the
        // text itself.
        if let Some(shadow) = &pass.shadow {
            self.draw_pass(
                text,
                x + shadow.offset_x,
                y + shadow.offset_y,
                pass,
                shadow.color,
            );
        }
        self.draw_pass(text, x, y, pass, pass.color);
    }

    fn snapshot(&self) -> RgbaImage {
        self.image.clone()
    }
}

/// Text measurement over fontdue metrics.
pub struct FontdueMeasurer {
    font: Arc<fontdue::Font>,
}

impl FontdueMeasurer {
    pub fn new(font: Arc<fontdue::Font>) -> Self {
        Self { font }
    }

    fn properties(&self, px: f32) -> FontProperties {
        match self.font.horizontal_line_metrics(px) {
            Some(metrics) => FontProperties {
                ascent: metrics.ascent,
                descent: -metrics.descent,
                font_size: px,
            },
            None => FontProperties {
                ascent: 0.8 * px,
                descent: 0.2 * px,
                font_size: px,
            },
        }
    }
}

impl TextMeasurer for FontdueMeasurer {
    fn measure_text(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let px = style.font_size;
        let count = text.chars().count();
        let mut width = 0.0;
        for ch in text.chars() {
            width += self.font.metrics(ch, px).advance_width;
        }
        width += style.letter_spacing * count.saturating_sub(1) as f32;

        let font_properties = self.properties(px);
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
        let px = font_css
            .split("px")
            .next()
            .and_then(|s| s.trim().parse::<f32>().ok())
            .unwrap_or(16.0);
        self.properties(px)
    }
}
