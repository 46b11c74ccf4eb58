//! PNG QR code rendering via the `qrcode` and `image` crates.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

use labinv_core::service::qr::QrRenderer;
use labinv_types::error::QrError;

/// Smallest edge length of rendered images, in pixels.
pub const MIN_DIMENSION: u32 = 300;

/// Renders black-on-white PNG QR codes of at least 300x300 pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngQrRenderer;

impl QrRenderer for PngQrRenderer {
    fn render_png(&self, content: &str) -> Result<Vec<u8>, QrError> {
        let code = QrCode::new(content.as_bytes()).map_err(|e| QrError::Render(e.to_string()))?;
        let buffer = code
            .render::<Luma<u8>>()
            .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
            .build();

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| QrError::Render(e.to_string()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_png_of_minimum_size() {
        let png = PngQrRenderer
            .render_png("http://localhost:8080/qr/5f0c7a3e-1111-4d2a-9c3b-0123456789ab")
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert!(decoded.width() >= MIN_DIMENSION);
        assert!(decoded.height() >= MIN_DIMENSION);
    }

    #[test]
    fn test_oversized_content_fails() {
        let huge = "x".repeat(8000);
        assert!(matches!(
            PngQrRenderer.render_png(&huge),
            Err(QrError::Render(_))
        ));
    }
}
