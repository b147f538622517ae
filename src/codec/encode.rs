use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use super::format::OutputFormat;
use super::TransformError;

/// AVIF speed preset (1 slowest/best .. 10 fastest).
const AVIF_SPEED: u8 = 4;

/// Encode a pixel surface into the requested format at the given quality.
///
/// Quality is meaningful for the lossy formats (webp/avif/jpeg). For PNG it
/// only selects a compression hint and may be ignored by the codec; for
/// pass-through the pixels are written back out in `source`, the format the
/// upload was decoded from.
pub fn encode_image(
    img: &DynamicImage,
    format: &OutputFormat,
    quality: u8,
    source: ImageFormat,
) -> Result<Vec<u8>, TransformError> {
    match format {
        OutputFormat::WebP => {
            // The image crate's WebP encoder is lossless-only, so lossy
            // encoding goes through the webp crate instead.
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder =
                webp::Encoder::from_image(&rgba).map_err(|e| encode_error("webp", e))?;
            Ok(encoder.encode(quality as f32).to_vec())
        }
        OutputFormat::Avif => {
            let mut buf = Cursor::new(Vec::new());
            let encoder = AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality);
            img.write_with_encoder(encoder)
                .map_err(|e| encode_error("avif", e))?;
            Ok(buf.into_inner())
        }
        OutputFormat::Jpeg => {
            let mut buf = Cursor::new(Vec::new());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            // JPEG has no alpha channel
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| encode_error("jpeg", e))?;
            Ok(buf.into_inner())
        }
        OutputFormat::Png => {
            let compression = if quality >= 90 {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let mut buf = Cursor::new(Vec::new());
            let encoder = PngEncoder::new_with_quality(&mut buf, compression, PngFilterType::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| encode_error("png", e))?;
            Ok(buf.into_inner())
        }
        OutputFormat::Passthrough(_) => {
            let mut buf = Cursor::new(Vec::new());
            let source_label = source.extensions_str().first().copied().unwrap_or("source");
            img.write_to(&mut buf, source)
                .map_err(|e| encode_error(source_label, e))?;
            Ok(buf.into_inner())
        }
    }
}

fn encode_error(format: &str, err: impl std::fmt::Display) -> TransformError {
    TransformError::Encode {
        format: format.to_string(),
        message: err.to_string(),
    }
}
