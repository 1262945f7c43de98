//! Image decoding and resizing using the `image` crate.

use crate::error::{Error, Result};
use crate::preprocess::InputShape;
use image::DynamicImage;
use image::imageops::FilterType;

/// Resampling filter used for every resize. Fixed so results are reproducible.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Decode uploaded bytes into an image, guessing the format from content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::Decode {
            reason: "empty upload".to_string(),
        });
    }

    image::load_from_memory(bytes).map_err(|e| Error::Decode {
        reason: e.to_string(),
    })
}

/// Resize to exactly `shape.width × shape.height` and return raw channel
/// values in row-major HWC order.
///
/// Aspect ratio is not preserved, matching how the classifier was trained.
pub fn resize_to(image: &DynamicImage, shape: InputShape) -> Result<Vec<u8>> {
    let (width, height) = shape.dimensions_u32()?;
    let resized = image.resize_exact(width, height, RESIZE_FILTER);

    match shape.channels {
        3 => Ok(resized.to_rgb8().into_raw()),
        1 => Ok(resized.to_luma8().into_raw()),
        other => Err(Error::ShapeMismatch {
            expected: "1 or 3 channels".to_string(),
            actual: format!("{other} channels"),
        }),
    }
}
