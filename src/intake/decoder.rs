use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::common::ImageSource;
use crate::error::DecodeError;

/// Turns an image source into an RGB pixel buffer.
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, source: &ImageSource) -> Result<RgbImage, DecodeError>;
}

/// Reads and decodes files from disk, shrinking wide photos to `max_width`.
pub struct FileImageDecoder {
    max_width: u32,
}

impl FileImageDecoder {
    pub fn new(max_width: u32) -> Self {
        Self {
            max_width: max_width.max(1),
        }
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<RgbImage, DecodeError> {
        let image = image::load_from_memory(bytes)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::EmptyImage);
        }
        Ok(downscale(image, self.max_width).to_rgb8())
    }
}

/// Preserves aspect ratio and never upscales.
fn downscale(image: DynamicImage, max_width: u32) -> DynamicImage {
    if image.width() <= max_width {
        return image;
    }

    let height = ((image.height() as u64 * max_width as u64) / image.width() as u64).max(1) as u32;
    image.resize_exact(max_width, height, FilterType::Triangle)
}

#[async_trait]
impl ImageDecoder for FileImageDecoder {
    async fn decode(&self, source: &ImageSource) -> Result<RgbImage, DecodeError> {
        let bytes = tokio::fs::read(source.path())
            .await
            .map_err(|e| DecodeError::Read(source.path().clone(), e))?;
        self.decode_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([200, 180, 30]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn small_images_keep_their_size() {
        let decoded = FileImageDecoder::new(1000).decode_bytes(&png(40, 30)).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[test]
    fn wide_images_are_downscaled() {
        let decoded = FileImageDecoder::new(100).decode_bytes(&png(400, 200)).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            FileImageDecoder::new(100).decode_bytes(b"not an image"),
            Err(DecodeError::Image(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let source = ImageSource::new("/nonexistent/lumicheck/a.jpg", "lumicheck/a.jpg");
        assert!(matches!(
            FileImageDecoder::new(100).decode(&source).await,
            Err(DecodeError::Read(_, _))
        ));
    }
}
