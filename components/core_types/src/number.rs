//! Number formatting.
//!
//! Lox prints numbers in the shortest `%g` style: six significant digits,
//! trailing zeros dropped, and scientific notation outside `[1e-4, 1e6)`.

const SIGNIFICANT_DIGITS: i32 = 6;

/// Format a number the way `print` shows it.
///
/// # Examples
///
/// ```
/// use core_types::format_number;
///
/// assert_eq!(format_number(7.0), "7");
/// assert_eq!(format_number(2.5), "2.5");
/// assert_eq!(format_number(1.0 / 3.0), "0.333333");
/// assert_eq!(format_number(1234567.0), "1.23457e+06");
/// assert_eq!(format_number(0.00001), "1e-05");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the significant digits first so the exponent reflects carries
    // such as 999999.5 -> 1e+06.
    let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}
