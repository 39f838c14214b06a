//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit `value` to the range `[min, max]`.
///
/// NaN is passed through unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}
