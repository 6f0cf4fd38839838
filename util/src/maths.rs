//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Linear interpolation between `a` and `b`, `t = 0` giving `a` and `t = 1`
/// giving `b`.
pub fn lerp<T>(a: T, b: T, t: T) -> T
where
    T: Float,
{
    (T::one() - t) * a + t * b
}

/// Clamp a value into the inclusive range `[min, max]`.
///
/// NaN values are passed through unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Round a value to the given number of decimal places.
pub fn round_dp<T>(value: T, places: i32) -> T
where
    T: Float,
{
    let scale = T::from(10.0).unwrap_or_else(T::one).powi(places);

    (value * scale).round() / scale
}
