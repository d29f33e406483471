//! Image attachments
//!
//! Everything that ends up in storage is a small JPEG inside a data URL:
//! avatars are squashed to 80x80, chat images are scaled down (never up)
//! to fit 400x400 keeping their aspect ratio.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

pub const AVATAR_SIZE: u32 = 80;
pub const CHAT_IMAGE_MAX: u32 = 400;
pub const JPEG_QUALITY: u8 = 70;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a supported image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Target dimensions for a chat image
pub fn chat_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }
    let scale = (CHAT_IMAGE_MAX as f64 / width as f64)
        .min(CHAT_IMAGE_MAX as f64 / height as f64)
        .min(1.0);
    let w = ((width as f64 * scale).floor() as u32).max(1);
    let h = ((height as f64 * scale).floor() as u32).max(1);
    (w, h)
}

pub fn avatar_from_bytes(bytes: &[u8]) -> Result<String, MediaError> {
    let img = image::load_from_memory(bytes)?;
    let thumb = img.resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Triangle);
    encode_data_url(&thumb)
}

pub fn chat_image_from_bytes(bytes: &[u8]) -> Result<String, MediaError> {
    let img = image::load_from_memory(bytes)?;
    let (w, h) = chat_dimensions(img.width(), img.height());
    let scaled = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };
    encode_data_url(&scaled)
}

pub async fn load_avatar(path: &Path) -> Result<String, MediaError> {
    let bytes = tokio::fs::read(path).await?;
    avatar_from_bytes(&bytes)
}

pub async fn load_chat_image(path: &Path) -> Result<String, MediaError> {
    let bytes = tokio::fs::read(path).await?;
    chat_image_from_bytes(&bytes)
}

fn encode_data_url(img: &DynamicImage) -> Result<String, MediaError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(format!("{}{}", DATA_URL_PREFIX, BASE64.encode(&buf)))
}

/// Raw bytes of a stored data URL, if it is one of ours
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let payload = url.strip_prefix(DATA_URL_PREFIX)?;
    BASE64.decode(payload).ok()
}

/// Pixel size of a stored image, for display next to the attachment marker
pub fn data_url_dimensions(url: &str) -> Option<(u32, u32)> {
    let bytes = decode_data_url(url)?;
    let img = image::load_from_memory(&bytes).ok()?;
    Some((img.width(), img.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 10, 128])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_chat_dimensions() {
        assert_eq!(chat_dimensions(800, 200), (400, 100));
        assert_eq!(chat_dimensions(300, 1200), (100, 400));
        assert_eq!(chat_dimensions(120, 90), (120, 90));
        assert_eq!(chat_dimensions(400, 400), (400, 400));
    }

    #[test]
    fn test_avatar_is_80_square_jpeg() {
        let url = avatar_from_bytes(&png(300, 150)).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(data_url_dimensions(&url), Some((80, 80)));
    }

    #[test]
    fn test_chat_image_keeps_aspect() {
        let url = chat_image_from_bytes(&png(1000, 500)).unwrap();
        assert_eq!(data_url_dimensions(&url), Some((400, 200)));

        let small = chat_image_from_bytes(&png(50, 20)).unwrap();
        assert_eq!(data_url_dimensions(&small), Some((50, 20)));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = chat_image_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = load_avatar(Path::new("/nonexistent/avatar.png")).await.unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }
}
