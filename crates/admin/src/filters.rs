//! Template filters for the admin pages.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Footer year. Usage: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Dong amount with thousands separators: `{{ food.price|vnd }}` renders
/// `45000` as `45.000 ₫`.
#[askama::filter_fn]
pub fn vnd(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_vnd(&value.to_string()))
}

/// Values that are not plain non-negative decimals come back unchanged.
fn format_vnd(raw: &str) -> String {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return raw.to_string();
    }

    let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 8);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(digit);
    }
    let fraction = fraction.trim_end_matches('0');
    if !fraction.is_empty() {
        out.push(',');
        out.push_str(fraction);
    }
    out.push_str(" ₫");
    out
}
