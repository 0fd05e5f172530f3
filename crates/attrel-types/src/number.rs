//! Number rendering compatible with the JVM's `Double.toString` and
//! `Float.toString`.
//!
//! Magnitudes in `[1e-3, 1e7)` print in plain notation with at least one
//! fraction digit (`1.0`, `0.001`, `3.1415927`); everything else prints as
//! `d.dddE±n` (`1.0E7`, `1.0E-5`). Digits are the shortest that round-trip.

/// Render an `f64` the way `Double.toString` does.
pub fn format_f64(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    let plain = magnitude == 0.0 || (1e-3..1e7).contains(&magnitude);
    render(value.is_sign_negative(), &format!("{magnitude:e}"), plain)
}

/// Render an `f32` the way `Float.toString` does.
pub fn format_f32(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    let plain = magnitude == 0.0 || (1e-3..1e7).contains(&magnitude);
    render(value.is_sign_negative(), &format!("{magnitude:e}"), plain)
}

/// Lay out shortest digits from Rust's `{:e}` output (`3.14e0`, `1e-5`).
fn render(negative: bool, scientific: &str, plain: bool) -> String {
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }

    if !plain {
        out.push_str(&digits[..1]);
        out.push('.');
        if digits.len() > 1 {
            out.push_str(&digits[1..]);
        } else {
            out.push('0');
        }
        out.push('E');
        out.push_str(&exponent.to_string());
        return out;
    }

    // digits before the decimal point
    let point = exponent + 1;
    if point <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat(point.unsigned_abs() as usize));
        out.push_str(&digits);
    } else {
        let point = point as usize;
        if point >= digits.len() {
            out.push_str(&digits);
            out.push_str(&"0".repeat(point - digits.len()));
            out.push_str(".0");
        } else {
            out.push_str(&digits[..point]);
            out.push('.');
            out.push_str(&digits[point..]);
        }
    }
    out
}
