use crate::error::CoreError;
use chrono::Utc;

const MAX_ROUNDING_DECIMALS: u32 = 15;

/// `of` as a percentage of `from`, rounded half away from zero to `decimals`
/// places and grouped with `,` thousands separators.
///
/// Results that are not strictly positive come back as `"0"`. A zero `from`
/// is rejected instead of dividing.
pub fn percentage_of(
    from: f64,
    of: f64,
    decimals: u32,
    with_sign: bool,
) -> Result<String, CoreError> {
    if from == 0.0 {
        return Err(CoreError::DivisionByZero);
    }

    let raw = (of / from) * 100.0;
    // f64 carries ~17 significant digits; rounding past that changes nothing.
    let factor = 10f64.powi(decimals.min(MAX_ROUNDING_DECIMALS) as i32);
    let scaled = raw * factor;
    let rounded = if scaled.is_finite() {
        scaled.round() / factor
    } else {
        raw
    };

    let mut out = if rounded.is_finite() && rounded > 0.0 {
        group_thousands(&format!("{:.*}", decimals as usize, rounded))
    } else {
        "0".to_string()
    };
    if with_sign {
        out.push('%');
    }
    Ok(out)
}

/// Insert `,` every three digits of the integer part of a plain decimal
/// string.
fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let digits = int_part.len();
    let mut grouped = String::with_capacity(digits + digits / 3 + 8);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Large non-negative counts in short form: `999`, `1K+`, `25M+`, `3B+`,
/// `7T+`. Values are truncated, never rounded up. Negative or non-finite
/// input yields `"0"`.
pub fn number_format_short(n: f64) -> String {
    const STEPS: &[(f64, &str)] = &[
        (1e12, "T+"),
        (1e9, "B+"),
        (1e6, "M+"),
        (1e3, "K+"),
    ];

    if !n.is_finite() || n < 0.0 {
        return "0".to_string();
    }

    for (scale, suffix) in STEPS {
        if n >= *scale {
            return format!("{:.0}{suffix}", (n / scale).floor());
        }
    }
    format!("{:.0}", n.floor())
}

/// Current wall-clock time in milliseconds, rounded to the nearest one.
pub fn micro_time() -> i64 {
    (Utc::now().timestamp_micros() as f64 / 1000.0).round() as i64
}
