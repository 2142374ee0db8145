use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use models::MonthKey;
use serde_json::Value;

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

/// Parses a month label into 1..=12.
///
/// Accepts full English names, three-letter abbreviations (plus `sept`) and
/// plain numbers, case-insensitively.
pub fn parse_month_label(label: &str) -> Option<u32> {
    let label = label.trim().trim_end_matches('.').to_ascii_lowercase();
    if label.is_empty() {
        return None;
    }

    if let Ok(n) = label.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }

    if label == "sept" {
        return Some(9);
    }

    MONTH_NAMES
        .iter()
        .position(|name| *name == label || (label.len() == 3 && name.starts_with(&label)))
        .map(|idx| idx as u32 + 1)
}

/// Parses a year from a JSON number or numeric string, limited to 1..=9999.
pub fn parse_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => v,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (1..=9999).contains(&year).then_some(year as i32)
}

/// Parses a plain calendar date (`YYYY-MM-DD` or `YYYY/MM/DD`) as UTC midnight.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Parses a creation timestamp.
///
/// Strings may be RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (with a space or `T`),
/// or a plain date. Integers are Unix seconds. `{"$date": ...}` wrappers are
/// unwrapped.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(Utc.from_utc_datetime(&naive));
                }
            }
            parse_date(s)
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        Value::Object(map) => map.get("$date").and_then(parse_timestamp),
        _ => None,
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn explicit_year(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn year_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Resolves the bucket key for a record.
///
/// Month and year are resolved independently: an explicit field wins, the
/// timestamp fills whatever is missing. An explicit value that does not parse
/// yields an `Unparsed` key carrying the raw text.
pub fn resolve_period(
    month: Option<&str>,
    year: Option<&Value>,
    timestamp: DateTime<Utc>,
) -> MonthKey {
    let month_part = match non_blank(month) {
        Some(label) => parse_month_label(label).ok_or_else(|| label.to_string()),
        None => Ok(timestamp.month()),
    };
    let year_part = match explicit_year(year) {
        Some(value) => parse_year(value).ok_or_else(|| year_text(value)),
        None => Ok(timestamp.year()),
    };

    match (month_part, year_part) {
        (Ok(m), Ok(y)) => MonthKey::calendar(y, m).unwrap_or_else(|| MonthKey::Unparsed {
            label: format!("{} {}", m, y),
        }),
        (m, y) => {
            let m = match m {
                Ok(n) => models::MONTH_ABBREVIATIONS[n as usize - 1].to_string(),
                Err(raw) => raw,
            };
            let y = y.map(|y| y.to_string()).unwrap_or_else(|raw| raw);
            MonthKey::Unparsed {
                label: format!("{} {}", m, y),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_month_label_variants() {
        assert_eq!(parse_month_label("January"), Some(1));
        assert_eq!(parse_month_label("jan"), Some(1));
        assert_eq!(parse_month_label(" FEB "), Some(2));
        assert_eq!(parse_month_label("Sept"), Some(9));
        assert_eq!(parse_month_label("Dec."), Some(12));
        assert_eq!(parse_month_label("7"), Some(7));
        assert_eq!(parse_month_label("13"), None);
        assert_eq!(parse_month_label("Ja"), None);
        assert_eq!(parse_month_label("Smarch"), None);
    }

    #[test]
    fn test_parse_year_number_and_string() {
        assert_eq!(parse_year(&json!(2024)), Some(2024));
        assert_eq!(parse_year(&json!(2024.0)), Some(2024));
        assert_eq!(parse_year(&json!(" 2023 ")), Some(2023));
        assert_eq!(parse_year(&json!("twenty")), None);
        assert_eq!(parse_year(&json!(2024.5)), None);
        assert_eq!(parse_year(&json!(0)), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-03-05T10:30:00Z")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-03-05 10:30:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-03-05T10:30:00.000")), Some(expected));
        assert_eq!(
            parse_timestamp(&json!({"$date": "2024-03-05T10:30:00Z"})),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(&json!(expected.timestamp())),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(&json!("2024/03/05")),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(&json!("not a date")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }

    #[test]
    fn test_resolve_period_explicit_fields() {
        let key = resolve_period(Some("March"), Some(&json!(2023)), ts(2024, 7, 1));
        assert_eq!(key, MonthKey::calendar(2023, 3).unwrap());
    }

    #[test]
    fn test_resolve_period_falls_back_to_timestamp() {
        let key = resolve_period(None, None, ts(2024, 7, 15));
        assert_eq!(key, MonthKey::calendar(2024, 7).unwrap());

        // Missing year only
        let key = resolve_period(Some("Feb"), None, ts(2024, 7, 15));
        assert_eq!(key, MonthKey::calendar(2024, 2).unwrap());

        // Blank fields count as missing
        let key = resolve_period(Some("  "), Some(&json!("")), ts(2022, 1, 3));
        assert_eq!(key, MonthKey::calendar(2022, 1).unwrap());
    }

    #[test]
    fn test_resolve_period_unparseable_label() {
        let key = resolve_period(Some("Smarch"), Some(&json!(2024)), ts(2024, 1, 1));
        assert_eq!(
            key,
            MonthKey::Unparsed {
                label: "Smarch 2024".to_string()
            }
        );

        let key = resolve_period(Some("4"), Some(&json!("next year")), ts(2024, 1, 1));
        assert_eq!(
            key,
            MonthKey::Unparsed {
                label: "Apr next year".to_string()
            }
        );
    }
}
