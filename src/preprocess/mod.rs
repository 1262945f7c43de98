//! Image preprocessing pipeline.

mod decode;
mod normalize;
mod tensor;

pub use decode::{decode_image, resize_to};
pub use normalize::normalize_pixel;
pub use tensor::{InputShape, Tensor};

use crate::error::Result;

/// Turn uploaded image bytes into a model input tensor.
///
/// Decodes, resizes to `shape` and normalizes. Pure: safe to call
/// concurrently for every image of a batch.
pub fn preprocess(bytes: &[u8], shape: InputShape) -> Result<Tensor> {
    let image = decode_image(bytes)?;
    let pixels = resize_to(&image, shape)?;
    let data = pixels.into_iter().map(normalize_pixel).collect();
    Tensor::new(shape, data)
}
