//! Checked numeric conversions between model tensors and `OpenCV` pixel space

use crate::{Error, Result};

/// Coordinates further than this from the origin are clamped before drawing.
/// `OpenCV` drawing routines misbehave close to `i32` limits.
pub const PIXEL_COORD_LIMIT: i32 = 1 << 20;

/// Safely convert usize to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds i32::MAX
pub fn usize_to_i32(value: usize) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Safely convert a non-negative `OpenCV` dimension to usize
///
/// # Errors
///
/// Returns an error if the value is negative
pub fn i32_to_usize(value: i32) -> Result<usize> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Negative dimension {value}")))
}

/// Safely convert f64 to i32 with bounds checking
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_possible_truncation)] // Truncation after bounds check is safe
pub fn f64_to_i32(value: f64) -> Result<i32> {
    if value.is_finite() && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Ok(value as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to i32"
        )))
    }
}

/// Clamp and convert f32 to i32
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(min as f32, max as f32);
    (clamped as i32).clamp(min, max)
}

/// Truncate a model-space coordinate to a drawable pixel coordinate.
/// Non-finite input maps to `-PIXEL_COORD_LIMIT`, which lands off-canvas.
#[inline]
#[must_use]
pub fn pixel_coord(value: f32) -> i32 {
    f32_to_i32_clamp(value, -PIXEL_COORD_LIMIT, PIXEL_COORD_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_usize_to_i32() {
        assert_eq!(usize_to_i32(42).unwrap(), 42);
        assert_eq!(usize_to_i32(0).unwrap(), 0);
        assert_eq!(usize_to_i32(i32::MAX as usize).unwrap(), i32::MAX);

        if std::mem::size_of::<usize>() > 4 {
            assert!(usize_to_i32(i32::MAX as usize + 1).is_err());
        }
    }

    #[test]
    fn test_i32_to_usize() {
        assert_eq!(i32_to_usize(640).unwrap(), 640);
        assert!(i32_to_usize(-1).is_err());
    }

    #[test]
    fn test_f64_to_i32() {
        assert_eq!(f64_to_i32(42.9).unwrap(), 42);
        assert_eq!(f64_to_i32(-42.0).unwrap(), -42);
        assert!(f64_to_i32(f64::NAN).is_err());
        assert!(f64_to_i32(f64::INFINITY).is_err());
        assert!(f64_to_i32(2147483648.0).is_err());
    }

    #[test]
    fn test_pixel_coord() {
        assert_eq!(pixel_coord(12.9), 12);
        assert_eq!(pixel_coord(-3.5), -3);
        assert_eq!(pixel_coord(1e12), PIXEL_COORD_LIMIT);
        assert_eq!(pixel_coord(f32::NAN), -PIXEL_COORD_LIMIT);
    }

    proptest! {
        #[test]
        fn prop_f32_to_i32_clamp_always_within_bounds(
            value in any::<f32>(),
            min in any::<i32>(),
            max in any::<i32>()
        ) {
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            let result = f32_to_i32_clamp(value, min, max);
            prop_assert!(result >= min);
            prop_assert!(result <= max);
        }

        #[test]
        fn prop_pixel_coord_matches_truncation(value in 0i32..100_000) {
            prop_assert_eq!(pixel_coord(value as f32 + 0.25), value);
        }
    }
}
