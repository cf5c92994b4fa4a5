//! Numeric coercion and derived metrics.
//!
//! Every function here is total: bad input and zero or missing denominators produce `None`,
//! never an error, a panic, `NaN` or an infinity.

use crate::types::Value;

/// Rates are expressed per this many residents.
pub const RATE_PER: f64 = 100_000.0;

/// Numeric view of a cell.
///
/// Numbers pass through; text is trimmed, thousands separators are removed and the remainder is
/// parsed as `f64`. Nulls, booleans, unparseable text and non-finite results are `None`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Int64(i) => *i as f64,
        Value::Float64(f) => *f,
        Value::Utf8(s) => parse_number(s)?,
        Value::Null | Value::Bool(_) => return None,
    };
    v.is_finite().then_some(v)
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(',') {
        trimmed.replace(',', "").parse::<f64>().ok()
    } else {
        trimmed.parse::<f64>().ok()
    }
}

/// First present value, in order.
pub fn coalesce<I>(candidates: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    candidates.into_iter().flatten().next()
}

/// `actual / population * 100_000`, or `None` unless both are present and `population > 0`.
pub fn crime_rate(actual: Option<f64>, population: Option<f64>) -> Option<f64> {
    match (actual, population) {
        (Some(a), Some(p)) if p > 0.0 => finite(a / p * RATE_PER),
        _ => None,
    }
}

/// `cleared / actual`, or `None` unless both are present and `actual > 0`.
pub fn clearance_ratio(cleared: Option<f64>, actual: Option<f64>) -> Option<f64> {
    match (cleared, actual) {
        (Some(c), Some(a)) if a > 0.0 => finite(c / a),
        _ => None,
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::{clearance_ratio, coalesce, coerce_f64, crime_rate};
    use crate::types::Value;

    #[test]
    fn coerces_numbers_and_numeric_text() {
        assert_eq!(coerce_f64(&Value::Int64(4)), Some(4.0));
        assert_eq!(coerce_f64(&Value::Float64(2.5)), Some(2.5));
        assert_eq!(coerce_f64(&Value::Utf8(" 12 ".into())), Some(12.0));
        assert_eq!(coerce_f64(&Value::Utf8("3.0".into())), Some(3.0));
        assert_eq!(coerce_f64(&Value::Utf8("1,234,567".into())), Some(1_234_567.0));
        assert_eq!(coerce_f64(&Value::Utf8("-2".into())), Some(-2.0));
    }

    #[test]
    fn non_numeric_input_coerces_to_none() {
        assert_eq!(coerce_f64(&Value::Null), None);
        assert_eq!(coerce_f64(&Value::Bool(true)), None);
        assert_eq!(coerce_f64(&Value::Utf8("n/a".into())), None);
        assert_eq!(coerce_f64(&Value::Utf8("".into())), None);
        assert_eq!(coerce_f64(&Value::Utf8("NaN".into())), None);
        assert_eq!(coerce_f64(&Value::Utf8("inf".into())), None);
        assert_eq!(coerce_f64(&Value::Float64(f64::NAN)), None);
    }

    #[test]
    fn coalesce_takes_first_present() {
        assert_eq!(coalesce([None, Some(2.0), Some(3.0)]), Some(2.0));
        assert_eq!(coalesce([Some(0.0), Some(3.0)]), Some(0.0));
        assert_eq!(coalesce([None, None]), None);
        assert_eq!(coalesce(Vec::<Option<f64>>::new()), None);
    }

    #[test]
    fn crime_rate_requires_positive_population() {
        assert_eq!(
            crime_rate(Some(5.0), Some(50_000.0)),
            Some(5.0 / 50_000.0 * 100_000.0)
        );
        assert_eq!(crime_rate(Some(0.0), Some(50_000.0)), Some(0.0));
        assert_eq!(crime_rate(Some(5.0), Some(0.0)), None);
        assert_eq!(crime_rate(Some(5.0), Some(-10.0)), None);
        assert_eq!(crime_rate(Some(5.0), None), None);
        assert_eq!(crime_rate(None, Some(50_000.0)), None);
    }

    #[test]
    fn clearance_ratio_requires_positive_actual() {
        assert_eq!(clearance_ratio(Some(1.0), Some(4.0)), Some(0.25));
        assert_eq!(clearance_ratio(Some(0.0), Some(0.0)), None);
        assert_eq!(clearance_ratio(Some(2.0), Some(-1.0)), None);
        assert_eq!(clearance_ratio(None, Some(4.0)), None);
        assert_eq!(clearance_ratio(Some(1.0), None), None);
    }
}
