//! Display formatting for accumulator results

/// Significant digits kept when a result is written to the display
pub const DEFAULT_SIGNIFICANT_DIGITS: usize = 15;

/// Largest precision an `f64` can meaningfully carry
pub const MAX_SIGNIFICANT_DIGITS: usize = 17;

/// Formats a computed value for the display.
///
/// The value is rounded to `digits` significant digits, then printed in its
/// shortest form so insignificant trailing zeros disappear. Very large and
/// very small magnitudes switch to exponent notation. Infinite values print
/// as `Infinity` / `-Infinity`.
#[must_use]
pub fn format_result(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }

    let digits = digits.clamp(1, MAX_SIGNIFICANT_DIGITS);
    let rounded: f64 = format!("{:.*e}", digits - 1, value)
        .parse()
        .unwrap_or(value);

    // Also folds negative zero
    if rounded == 0.0 {
        return "0".to_string();
    }

    let magnitude = rounded.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        format!("{rounded:e}")
    } else {
        format!("{rounded}")
    }
}

/// Parses display text back into a number.
///
/// Accepts everything [`format_result`] produces plus partially typed input
/// such as `"5."`. Unparsable text reads as zero.
#[must_use]
pub fn parse_display(display: &str) -> f64 {
    display.parse().unwrap_or(0.0)
}
