//! Pure normalizers for individual raw values.
//!
//! None of these functions fail. Each returns an [`Outcome`] so callers (and
//! tests) can tell a clean parse apart from a fallback, while both still carry
//! a usable value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde_json::Value;

/// Why a normalizer fell back instead of parsing cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No value (absent, null or blank).
    Missing,
    /// Not parseable as a date, but shaped like `YYYY-MM-DD...`; cut to 10 chars.
    Truncated,
    /// Not parseable; the trimmed original text is kept.
    Unparseable,
    /// Not a number.
    NotNumeric,
    /// Text outside the known vocabulary; kept as-is.
    Unrecognized,
}

/// Result of normalizing one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Parsed(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Outcome<T> {
    fn fallback(value: T, reason: FallbackReason) -> Self {
        Outcome::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Parsed(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Parsed(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Outcome::Parsed(_))
    }

    pub fn reason(&self) -> Option<FallbackReason> {
        match self {
            Outcome::Parsed(_) => None,
            Outcome::Fallback { reason, .. } => Some(*reason),
        }
    }
}

/// True when a raw value carries something: not null, not a blank string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Scalar value rendered as trimmed text. Objects, arrays and null give `None`.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Trimmed text of a resolved value, empty when absent.
pub fn normalize_text(raw: Option<&Value>) -> String {
    raw.and_then(text_of).unwrap_or_default()
}

/// An ISO-8601 value in the shape it was written.
#[derive(Debug, Clone, Copy, PartialEq)]
enum IsoValue {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
    Date(NaiveDate),
}

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

fn parse_iso(text: &str) -> Option<IsoValue> {
    // `Z` is read as a zero UTC offset.
    let text = match text.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => text.to_string(),
    };

    if let Some(dt) = ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&text, fmt).ok())
    {
        return Some(IsoValue::Zoned(dt));
    }

    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
    {
        return Some(IsoValue::Naive(dt));
    }

    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .map(IsoValue::Date)
}

/// True when the 5th and 8th characters are `-`, as in `YYYY-MM-DD...`.
fn looks_like_iso_date(text: &str) -> bool {
    let chars: Vec<char> = text.chars().take(8).collect();
    chars.len() == 8 && chars[4] == '-' && chars[7] == '-'
}

/// Normalize to a `YYYY-MM-DD` date.
///
/// Datetimes keep the calendar date of their own offset. Absent values give an
/// empty string.
pub fn normalize_date(raw: Option<&Value>) -> Outcome<String> {
    let Some(text) = raw.and_then(text_of).filter(|t| !t.is_empty()) else {
        return Outcome::fallback(String::new(), FallbackReason::Missing);
    };

    match parse_iso(&text) {
        Some(IsoValue::Zoned(dt)) => Outcome::Parsed(dt.date_naive().to_string()),
        Some(IsoValue::Naive(dt)) => Outcome::Parsed(dt.date().to_string()),
        Some(IsoValue::Date(date)) => Outcome::Parsed(date.to_string()),
        None if looks_like_iso_date(&text) => Outcome::fallback(
            text.chars().take(10).collect(),
            FallbackReason::Truncated,
        ),
        None => Outcome::fallback(text, FallbackReason::Unparseable),
    }
}

/// Normalize to a full ISO-8601 datetime.
///
/// The offset is preserved when present; fractional seconds keep their
/// natural precision.
pub fn normalize_datetime(raw: Option<&Value>) -> Outcome<String> {
    let Some(text) = raw.and_then(text_of).filter(|t| !t.is_empty()) else {
        return Outcome::fallback(String::new(), FallbackReason::Missing);
    };

    match parse_iso(&text) {
        Some(IsoValue::Zoned(dt)) => {
            Outcome::Parsed(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
        Some(IsoValue::Naive(dt)) => {
            Outcome::Parsed(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        Some(IsoValue::Date(date)) => {
            Outcome::Parsed(date.format("%Y-%m-%dT00:00:00").to_string())
        }
        None => Outcome::fallback(text, FallbackReason::Unparseable),
    }
}

/// Parse a percentage and clamp it to [0, 100].
///
/// Accepts numbers and numeric strings; a comma decimal separator and a
/// trailing `%` are tolerated.
pub fn parse_percentage(raw: Option<&Value>) -> Outcome<Option<f64>> {
    let parsed = match raw {
        None | Some(Value::Null) => {
            return Outcome::fallback(None, FallbackReason::Missing);
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let text = s.trim();
            if text.is_empty() {
                return Outcome::fallback(None, FallbackReason::Missing);
            }
            let text = text.strip_suffix('%').unwrap_or(text).trim_end();
            text.replace(',', ".").parse::<f64>().ok()
        }
        Some(_) => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Outcome::Parsed(Some(n.clamp(0.0, 100.0))),
        _ => Outcome::fallback(None, FallbackReason::NotNumeric),
    }
}

/// Literal yes-forms accepted for boolean flag columns, compared lower-cased.
const TRUTHY: &[&str] = &["1", "true", "oui", "yes", "vrai"];

/// Map a boolean-ish flag to 1 or 0.
pub fn flag_value(raw: Option<&Value>) -> u8 {
    let truthy = match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
        _ => false,
    };
    u8::from(truthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(value: Value) -> Outcome<String> {
        normalize_date(Some(&value))
    }

    fn datetime(value: Value) -> Outcome<String> {
        normalize_datetime(Some(&value))
    }

    fn pct(value: Value) -> Option<f64> {
        parse_percentage(Some(&value)).into_value()
    }

    #[test]
    fn test_is_present() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!(" ")));
        assert!(is_present(&json!("x")));
        assert!(is_present(&json!(0)));
        assert!(is_present(&json!(false)));
    }

    #[test]
    fn test_text_of_scalars() {
        assert_eq!(text_of(&json!("  hello ")), Some("hello".to_string()));
        assert_eq!(text_of(&json!(42)), Some("42".to_string()));
        assert_eq!(text_of(&json!({"label": "x"})), None);
        assert_eq!(normalize_text(None), "");
    }

    #[test]
    fn test_date_with_offset_keeps_local_date() {
        let outcome = date(json!("2025-12-19T14:31:31.568+01:00"));
        assert_eq!(outcome, Outcome::Parsed("2025-12-19".to_string()));

        // 23:30 at -05:00 is already the 20th in UTC, the local date wins.
        let outcome = date(json!("2025-12-19T23:30:00-05:00"));
        assert_eq!(outcome.value(), "2025-12-19");
    }

    #[test]
    fn test_date_variants() {
        assert_eq!(date(json!("2025-03-01")).value(), "2025-03-01");
        assert_eq!(date(json!("2025-03-01T08:00:00Z")).value(), "2025-03-01");
        assert_eq!(date(json!("2025-03-01T08:00:00")).value(), "2025-03-01");
        assert_eq!(date(json!(" 2025-03-01 ")).value(), "2025-03-01");
    }

    #[test]
    fn test_date_truncation_fallback() {
        let outcome = date(json!("2025-13-45 something"));
        assert_eq!(outcome.value(), "2025-13-45");
        assert_eq!(outcome.reason(), Some(FallbackReason::Truncated));
    }

    #[test]
    fn test_date_unparseable_passes_through() {
        let outcome = date(json!("mars 2025"));
        assert_eq!(outcome.value(), "mars 2025");
        assert_eq!(outcome.reason(), Some(FallbackReason::Unparseable));
    }

    #[test]
    fn test_date_missing_is_empty_string() {
        assert_eq!(normalize_date(None).value(), "");
        assert_eq!(date(Value::Null).value(), "");
        assert_eq!(date(json!("   ")).reason(), Some(FallbackReason::Missing));
    }

    #[test]
    fn test_datetime_preserves_offset_and_fraction() {
        let outcome = datetime(json!("2025-12-19T14:31:31.568+01:00"));
        assert_eq!(
            outcome,
            Outcome::Parsed("2025-12-19T14:31:31.568+01:00".to_string())
        );
    }

    #[test]
    fn test_datetime_zulu_becomes_zero_offset() {
        let outcome = datetime(json!("2025-01-02T03:04:05Z"));
        assert_eq!(outcome.value(), "2025-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_datetime_naive_and_date_only() {
        assert_eq!(
            datetime(json!("2025-01-02T03:04:05")).value(),
            "2025-01-02T03:04:05"
        );
        assert_eq!(
            datetime(json!("2025-01-02")).value(),
            "2025-01-02T00:00:00"
        );
    }

    #[test]
    fn test_datetime_unparseable_is_unchanged() {
        let outcome = datetime(json!("  hier soir "));
        assert_eq!(outcome.value(), "hier soir");
        assert!(!outcome.is_parsed());
    }

    #[test]
    fn test_percentage_clamping() {
        assert_eq!(pct(json!("150")), Some(100.0));
        assert_eq!(pct(json!("-20")), Some(0.0));
        assert_eq!(pct(json!("abc")), None);
        assert_eq!(pct(json!("45,5")), Some(45.5));
    }

    #[test]
    fn test_percentage_numbers_and_suffix() {
        assert_eq!(pct(json!(42)), Some(42.0));
        assert_eq!(pct(json!(12.5)), Some(12.5));
        assert_eq!(pct(json!("80 %")), Some(80.0));
        assert_eq!(pct(json!("NaN")), None);
        assert_eq!(pct(json!(true)), None);
        for infinite in ["inf", "infinity", "-inf", "+Infinity"] {
            assert_eq!(pct(json!(infinite)), None, "{infinite}");
        }
    }

    #[test]
    fn test_percentage_reasons() {
        assert_eq!(
            parse_percentage(None).reason(),
            Some(FallbackReason::Missing)
        );
        assert_eq!(
            parse_percentage(Some(&json!("abc"))).reason(),
            Some(FallbackReason::NotNumeric)
        );
        assert!(parse_percentage(Some(&json!("150"))).is_parsed());
    }

    #[test]
    fn test_flag_value() {
        let truthy_values = [
            json!(1),
            json!("1"),
            json!(true),
            json!("true"),
            json!("True"),
            json!("Oui"),
            json!("yes"),
        ];
        for truthy in truthy_values {
            assert_eq!(flag_value(Some(&truthy)), 1, "{truthy}");
        }
        let falsy_values = [json!(0), json!("0"), json!(false), json!("non"), json!(""), Value::Null];
        for falsy in falsy_values {
            assert_eq!(flag_value(Some(&falsy)), 0, "{falsy}");
        }
        assert_eq!(flag_value(None), 0);
    }
}
