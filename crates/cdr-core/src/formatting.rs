//! Number formatting for the totals report.
//!
//! Amounts are rendered from Rust's own fixed-point formatting and then
//! grouped, so values of any magnitude print exactly. A sum that has
//! overflowed prints as [`NOT_A_NUMBER`] instead of a digit string.

/// Placeholder printed for an infinite or NaN total.
pub const NOT_A_NUMBER: &str = "n/a";

/// Two-decimal amount with thousands separators, e.g. `1,234.50`.
///
/// ```
/// use cdr_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.5), "1,234.50");
/// assert_eq!(format_amount(-0.25), "-0.25");
/// assert_eq!(format_amount(f64::INFINITY), "n/a");
/// ```
pub fn format_amount(value: f64) -> String {
    signed_fixed(value, 2, "")
}

/// Two-decimal amount with a dollar sign, e.g. `$1,234.50` or `-$9.99`.
///
/// ```
/// use cdr_core::formatting::format_currency;
///
/// assert_eq!(format_currency(3.75), "$3.75");
/// assert_eq!(format_currency(-9.99), "-$9.99");
/// ```
pub fn format_currency(value: f64) -> String {
    signed_fixed(value, 2, "$")
}

/// Whole minutes with thousands separators. Fractions are truncated.
///
/// ```
/// use cdr_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(15.0), "15");
/// assert_eq!(format_minutes(1234.9), "1,234");
/// ```
pub fn format_minutes(minutes: f64) -> String {
    signed_fixed(minutes.trunc(), 0, "")
}

/// Integer count with thousands separators.
///
/// ```
/// use cdr_core::formatting::format_count;
///
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_digits(&value.to_string())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn signed_fixed(value: f64, decimals: usize, unit: &str) -> String {
    if !value.is_finite() {
        return NOT_A_NUMBER.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + unit.len() + 1);
    // No sign for values that round to zero.
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    out.push_str(unit);
    out.push_str(&group_digits(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Insert a comma between every group of three digits, counted from the right.
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
