//! Identifiers synthesized from sub-fields when a file does not carry them directly.

use chrono::NaiveDate;

use super::metrics::coerce_f64;
use crate::types::Value;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number (1-12) from a numeric cell or an English month name, case-insensitive.
pub fn month_number(value: &Value) -> Option<u32> {
    if let Some(name) = value.as_str() {
        let lower = name.trim().to_ascii_lowercase();
        if let Some(pos) = MONTH_NAMES.iter().position(|m| *m == lower) {
            return u32::try_from(pos + 1).ok();
        }
    }
    whole_number(value)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|m| (1..=12).contains(m))
}

/// First day of the report month, formatted `YYYY-MM-DD`.
pub fn period_date(year: &Value, month: &Value) -> Option<String> {
    let year = whole_number(year).and_then(|y| i32::try_from(y).ok())?;
    let month = month_number(month)?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Place-level geographic identifier: 2-digit state FIPS followed by 5-digit place FIPS.
pub fn place_geoid(state_code: &Value, place_code: &Value) -> Option<String> {
    let state = whole_number(state_code).filter(|s| (0..100).contains(s))?;
    let place = whole_number(place_code).filter(|p| (0..100_000).contains(p))?;
    Some(format!("{state:02}{place:05}"))
}

fn whole_number(value: &Value) -> Option<i64> {
    let v = coerce_f64(value)?;
    (v.fract() == 0.0).then_some(v as i64)
}
