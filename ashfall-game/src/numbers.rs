//! Numeric conversion helpers centralizing the casts between float vitals
//! and integer attributes.

use num_traits::cast::cast;

/// Round a f32 half away from zero and clamp it into the i32 range.
/// NaN maps to 0.
#[must_use]
pub fn round_to_i32(value: f32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let wide = f64::from(value).round();
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    cast::<f64, i32>(wide.clamp(min, max)).unwrap_or(0)
}

/// Widen an integer delta into the float space used by hunger, energy and radiation.
#[must_use]
pub fn i32_to_f32(value: i32) -> f32 {
    cast::<i32, f32>(value).unwrap_or(0.0)
}

/// Clamp a float into `[min, max]`, mapping non-finite input to `min`.
#[must_use]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max.max(min))
    } else {
        min
    }
}

/// Ratio of `part` over `whole`; a non-positive `whole` counts as fully loaded.
#[must_use]
pub fn ratio(part: f32, whole: f32) -> f32 {
    if whole <= 0.0 || !whole.is_finite() {
        return 1.0;
    }
    let value = part / whole;
    if value.is_finite() { value.max(0.0) } else { 1.0 }
}

/// `max(floor, round(difference * scale))`, the shape shared by every combat hit.
#[must_use]
pub fn scaled_damage(attacker: i32, defender: i32, scale: f32, floor: i32) -> i32 {
    let difference = attacker.saturating_sub(defender);
    round_to_i32(i32_to_f32(difference) * scale).max(floor)
}
