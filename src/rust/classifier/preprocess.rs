use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use ndarray::Array4;

use super::error::ClassifierError;

/// Decodes an uploaded image (JPEG, PNG, ...) from memory.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    if bytes.is_empty() {
        return Err(ClassifierError::InvalidImage("Image data is empty".into()));
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Opens and decodes an image file, guessing the format from its contents.
pub fn open_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, ClassifierError> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)
        .map_err(|e| ClassifierError::InvalidImage(format!("Failed to open {:?}: {}", path, e)))?
        .with_guessed_format()
        .map_err(|e| ClassifierError::InvalidImage(format!("Failed to read {:?}: {}", path, e)))?;
    Ok(reader.decode()?)
}

/// Turns an arbitrary image into a single-image model batch.
///
/// The image is converted to RGB, resampled to `input_size` x `input_size`
/// with a triangle (bilinear) filter and scaled to [0, 1]. The result has
/// shape `[1, input_size, input_size, 3]`.
///
/// # Errors
/// - `InvalidImage` if the image has no pixels
/// - `ValidationError` if `input_size` is zero
pub fn preprocess(image: &DynamicImage, input_size: u32) -> Result<Array4<f32>, ClassifierError> {
    if input_size == 0 {
        return Err(ClassifierError::ValidationError("Model input size must be positive".into()));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(ClassifierError::InvalidImage(
            format!("Image has no pixels ({}x{})", image.width(), image.height())
        ));
    }

    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, input_size, input_size, FilterType::Triangle);

    let side = input_size as usize;
    let pixels: Vec<f32> = resized.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
    Array4::from_shape_vec((1, side, side, 3), pixels)
        .map_err(|e| ClassifierError::InvalidImage(format!("Failed to build input batch: {}", e)))
}
