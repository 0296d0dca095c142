//! Image loading, resizing, and base64 encoding for the vision API.
//!
//! Uploads are resized to max 1024px on the longest edge before sending to
//! control API costs and stay under payload limits.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use tracing::info;

use crate::error::ClassifyError;

/// Maximum dimension (width or height) for images sent to the vision API.
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

/// Minimum dimension for usable classification (too small = unreliable).
pub const MIN_IMAGE_DIMENSION: u32 = 32;

/// Prepare an upload for the vision API: decode, validate, resize, re-encode
/// as JPEG, base64 encode.
///
/// # Errors
/// `InvalidImage` when the bytes cannot be decoded or the image is below the
/// minimum dimension.
pub fn prepare_image(image_bytes: &[u8]) -> Result<String, ClassifyError> {
    let img = image::load_from_memory(image_bytes).map_err(|e| {
        ClassifyError::InvalidImage(format!(
            "failed to decode image: {}. Expected JPEG/PNG/WebP.",
            e
        ))
    })?;

    let (width, height) = (img.width(), img.height());
    info!("Loaded image: {}x{}", width, height);

    if width.min(height) < MIN_IMAGE_DIMENSION {
        return Err(ClassifyError::InvalidImage(format!(
            "image too small for classification: {}x{} (minimum {}px)",
            width, height, MIN_IMAGE_DIMENSION
        )));
    }

    let resized = resize_if_needed(img, MAX_IMAGE_DIMENSION);
    if resized.width() != width {
        info!("Resized to: {}x{}", resized.width(), resized.height());
    }

    let jpeg_bytes = encode_to_jpeg(&resized)?;
    Ok(STANDARD.encode(&jpeg_bytes))
}

/// Resize if either dimension exceeds max, maintaining aspect ratio.
fn resize_if_needed(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width <= max_dimension && height <= max_dimension {
        return img;
    }

    let scale = max_dimension as f32 / width.max(height) as f32;
    let new_width = (width as f32 * scale) as u32;
    let new_height = (height as f32 * scale) as u32;
    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn encode_to_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ClassifyError> {
    // JPEG encoding can't represent alpha; flatten first.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| ClassifyError::InvalidImage(format!("failed to encode JPEG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Media type for the API payload.
pub fn image_media_type() -> &'static str {
    "image/jpeg"
}
