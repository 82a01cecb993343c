//! Texture loading with worker-pool decode.
//!
//! Fetches run on the async executor; the CPU-bound decode runs on the
//! bounded blocking pool (the pipeline's only true parallelism). Unload
//! releases the pixel buffer while leaving texture handles valid.

use std::sync::Arc;

use async_trait::async_trait;
use mural_core::{Texture, TextureSource};

use crate::descriptor::AssetDescriptor;
use crate::error::AssetError;
use crate::parser::{AssetParser, LoadContext, ParserCaps, ParserPriority};
use crate::value::AssetValue;

const FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// Loads bitmap images into textures.
#[derive(Debug, Default)]
pub struct TextureParser;

impl TextureParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetParser for TextureParser {
    fn name(&self) -> &str {
        "texture"
    }

    fn priority(&self) -> ParserPriority {
        ParserPriority::High
    }

    fn capabilities(&self) -> ParserCaps {
        ParserCaps::loader().with_unload()
    }

    fn test(&self, _url: &str, descriptor: &AssetDescriptor) -> bool {
        descriptor
            .effective_format()
            .is_some_and(|format| FORMATS.contains(&format.as_str()))
    }

    async fn load(
        &self,
        url: &str,
        _descriptor: &AssetDescriptor,
        ctx: &LoadContext,
    ) -> Result<AssetValue, AssetError> {
        let fetched = ctx.platform.fetch(url).await?;
        let image = ctx.decode.decode(Arc::new(fetched.bytes)).await?;
        let source = Arc::new(TextureSource::from_image(url, image));
        Ok(AssetValue::Texture(Texture::from_source(source)))
    }

    async fn unload(&self, value: &AssetValue, _descriptor: &AssetDescriptor) {
        if let AssetValue::Texture(texture) = value {
            log::debug!("releasing texture '{}'", texture.source().label());
            texture.source().release_pixels();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::testing;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn loads_a_png_into_a_texture() {
        let ctx = testing::context(
            testing::MemoryPlatform::new().with_file("hero.png", png_bytes(4, 3)),
        );
        let parser = TextureParser::new();
        let value = parser
            .load("hero.png", &AssetDescriptor::new("hero.png"), &ctx)
            .await
            .unwrap();

        let texture = value.as_texture().unwrap();
        assert_eq!(texture.source().width(), 4);
        assert_eq!(texture.source().height(), 3);
        assert!(texture.source().has_pixels());
    }

    #[tokio::test]
    async fn unload_releases_pixels() {
        let ctx = testing::context(
            testing::MemoryPlatform::new().with_file("hero.png", png_bytes(2, 2)),
        );
        let parser = TextureParser::new();
        let descriptor = AssetDescriptor::new("hero.png");
        let value = parser.load("hero.png", &descriptor, &ctx).await.unwrap();

        parser.unload(&value, &descriptor).await;
        assert!(!value.as_texture().unwrap().source().has_pixels());
    }

    #[tokio::test]
    async fn truncated_bytes_are_a_decode_error() {
        let ctx = testing::context(
            testing::MemoryPlatform::new().with_file("bad.png", vec![0x89, 0x50]),
        );
        let parser = TextureParser::new();
        let result = parser
            .load("bad.png", &AssetDescriptor::new("bad.png"), &ctx)
            .await;
        assert!(matches!(result, Err(AssetError::Decode(_))));
    }
}
