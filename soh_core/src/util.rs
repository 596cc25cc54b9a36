//! Range helpers for decoded SOH values.

/// Lowest physically meaningful SOH (%).
pub const SOH_MIN: f64 = 0.0;
/// Highest physically meaningful SOH (%).
pub const SOH_MAX: f64 = 100.0;

/// Clamp a finite SOH value into `[SOH_MIN, SOH_MAX]`.
///
/// Returns the clamped value and whether clamping changed it.
#[inline]
pub fn clamp_soh(value: f64) -> (f64, bool) {
    debug_assert!(value.is_finite(), "clamp_soh: non-finite input {value}");
    let clamped = value.clamp(SOH_MIN, SOH_MAX);
    (clamped, clamped != value)
}
