//! Codec adapter over the `image` and `webp` crates: decode with source
//! format detection, fit-inside resize, and per-format encoding.

pub mod encode;
pub mod format;
pub mod resize;

pub use encode::encode_image;
pub use format::OutputFormat;
pub use resize::{fit_width, resize_to_width};

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("empty image payload")]
    EmptyInput,

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("{format} encode failed: {message}")]
    Encode { format: String, message: String },
}

/// Decode an upload into a pixel surface, reporting the detected source
/// format. Detection goes by magic bytes, not the declared MIME type, so a
/// forged content type still fails here.
pub fn decode_image(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), TransformError> {
    let source = image::guess_format(bytes).map_err(|e| TransformError::Decode(e.to_string()))?;
    let img = image::load_from_memory_with_format(bytes, source)
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    Ok((img, source))
}
