//! Pixel normalization.

use crate::constants::normalization::{OFFSET, SCALE};

/// Map a raw channel value from `[0, 255]` to `[-1, 1]`.
#[inline]
pub fn normalize_pixel(value: u8) -> f32 {
    f32::from(value) / SCALE - OFFSET
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bounds() {
        assert_eq!(normalize_pixel(0), -1.0);
        assert_eq!(normalize_pixel(255), 1.0);
        assert!(normalize_pixel(127).abs() < 0.01);
    }

    #[test]
    fn test_normalize_is_monotonic() {
        let values: Vec<f32> = (0..=255u8).map(normalize_pixel).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }
}
