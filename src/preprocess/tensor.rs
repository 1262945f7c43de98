//! Fixed-shape model input.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Input dimensions a model expects for a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    /// Height in pixels.
    pub height: usize,
    /// Width in pixels.
    pub width: usize,
    /// Number of channels (1 = grayscale, 3 = RGB).
    pub channels: usize,
}

impl InputShape {
    /// Create a new input shape.
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of `f32` values in one tensor of this shape.
    pub const fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// True if any dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width and height as `u32`, as required by the `image` crate.
    pub fn dimensions_u32(&self) -> Result<(u32, u32)> {
        let convert = |v: usize| {
            u32::try_from(v).map_err(|_| Error::ShapeMismatch {
                expected: "dimension fitting in u32".to_string(),
                actual: v.to_string(),
            })
        };
        Ok((convert(self.width)?, convert(self.height)?))
    }
}

impl Default for InputShape {
    fn default() -> Self {
        use crate::constants::input_shape::{CHANNELS, HEIGHT, WIDTH};
        Self::new(HEIGHT, WIDTH, CHANNELS)
    }
}

impl std::fmt::Display for InputShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// One preprocessed image in row-major HWC layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: InputShape,
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap `data`, checking it holds exactly `shape.len()` values.
    pub fn new(shape: InputShape, data: Vec<f32>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} values ({shape})", shape.len()),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self { shape, data })
    }

    /// Shape of this tensor.
    pub fn shape(&self) -> InputShape {
        self.shape
    }

    /// Flat tensor values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
