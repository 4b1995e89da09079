use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?::(\d{2}))?\s*(am|pm)?\b").unwrap()
});

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%d.%m.%Y"];
const FILLER_WORDS: &[&str] = &["at", "of", "the", "on"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("malformed number: {0:?}")]
    MalformedNumber(String),
    #[error("malformed duration: {0:?}")]
    MalformedDuration(String),
    #[error("unparseable date: {0:?}")]
    UnparseableDate(String),
}

/// Parse a count such as `"1,234"`. Grouping commas are dropped, everything
/// else must be an ASCII digit.
pub fn parse_count(raw: &str) -> Result<u64, FieldError> {
    let digits = raw.replace(',', "");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::MalformedNumber(raw.to_string()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| FieldError::MalformedNumber(raw.to_string()))
}

/// `"M:SS"` → total seconds. Minutes are unbounded.
pub fn parse_duration(raw: &str) -> Result<u64, FieldError> {
    let malformed = || FieldError::MalformedDuration(raw.to_string());
    let parts: Vec<&str> = raw.split(':').collect();
    let [mins, secs] = parts.as_slice() else {
        return Err(malformed());
    };
    let mins = parse_digits(mins).ok_or_else(malformed)?;
    let secs = parse_digits(secs).ok_or_else(malformed)?;
    mins.checked_mul(60)
        .and_then(|m| m.checked_add(secs))
        .ok_or_else(malformed)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse the free-text reporting date of a digest header.
///
/// Accepts ISO dates (optionally with a time), slashed US dates, and
/// month-name dates such as `"Tuesday, March 3rd, 2020 at 1:30 pm"`.
/// Dates without a time of day resolve to midnight.
pub fn parse_report_date(raw: &str) -> Result<NaiveDateTime, FieldError> {
    let trimmed = raw.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    parse_month_name_date(trimmed).ok_or_else(|| FieldError::UnparseableDate(raw.to_string()))
}

fn parse_month_name_date(s: &str) -> Option<NaiveDateTime> {
    let (time, rest) = match TIME_RE.captures(s) {
        Some(caps) => {
            let time = time_from_captures(&caps)?;
            let span = caps.get(0)?;
            (time, format!("{} {}", &s[..span.start()], &s[span.end()..]))
        }
        None => (NaiveTime::MIN, s.to_string()),
    };

    let mut month = None;
    let mut day = None;
    let mut year = None;

    for token in rest
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let lower = token.to_ascii_lowercase();
        if let Some(m) = month_token_to_number(&lower) {
            if month.replace(m).is_some() {
                return None;
            }
            continue;
        }
        if is_weekday(&lower) || FILLER_WORDS.contains(&lower.as_str()) {
            continue;
        }

        let digits = strip_ordinal(&lower)?;
        match digits.len() {
            4 => {
                if year.replace(digits.parse::<i32>().ok()?).is_some() {
                    return None;
                }
            }
            1 | 2 => {
                if day.replace(digits.parse::<u32>().ok()?).is_some() {
                    return None;
                }
            }
            _ => return None,
        }
    }

    NaiveDate::from_ymd_opt(year?, month?, day?).map(|d| d.and_time(time))
}

fn time_from_captures(caps: &regex::Captures<'_>) -> Option<NaiveTime> {
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;

    match caps.get(4).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// `"7th"` → `"7"`; plain digit strings pass through. Anything else is rejected.
fn strip_ordinal(token: &str) -> Option<&str> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn month_token_to_number(token: &str) -> Option<u32> {
    match token {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "sept" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}

fn is_weekday(token: &str) -> bool {
    matches!(
        token,
        "mon" | "monday"
            | "tue" | "tues" | "tuesday"
            | "wed" | "wednesday"
            | "thu" | "thur" | "thurs" | "thursday"
            | "fri" | "friday"
            | "sat" | "saturday"
            | "sun" | "sunday"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::MIN)
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("1,234"), Ok(1234));
        assert_eq!(parse_count("12"), Ok(12));
        assert_eq!(parse_count("1,234,567"), Ok(1_234_567));
        assert_eq!(parse_count("0"), Ok(0));
    }

    #[test]
    fn malformed_counts() {
        assert_eq!(parse_count("12a"), Err(FieldError::MalformedNumber("12a".into())));
        assert!(parse_count("").is_err());
        assert!(parse_count(",").is_err());
        assert!(parse_count("-5").is_err());
        assert!(parse_count("1.5").is_err());
        assert!(parse_count("1.234").is_err());
        assert!(parse_count("99999999999999999999999").is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("3:45"), Ok(225));
        assert_eq!(parse_duration("0:09"), Ok(9));
        assert_eq!(parse_duration("61:00"), Ok(3660));
    }

    #[test]
    fn malformed_durations() {
        for raw in ["345", "1:2:3", "a:10", "1:", ":30", "1:3x", ""] {
            assert_eq!(
                parse_duration(raw),
                Err(FieldError::MalformedDuration(raw.into())),
                "{raw}"
            );
        }
    }

    #[test]
    fn iso_dates() {
        assert_eq!(parse_report_date("2020-01-01"), Ok(midnight(2020, 1, 1)));
        assert_eq!(parse_report_date(" 2020-01-01 "), Ok(midnight(2020, 1, 1)));
        let dt = parse_report_date("2020-01-01 13:45:00").unwrap();
        assert_eq!(dt.format("%F %T").to_string(), "2020-01-01 13:45:00");
    }

    #[test]
    fn slashed_dates_are_month_first() {
        assert_eq!(parse_report_date("03/04/2020"), Ok(midnight(2020, 3, 4)));
    }

    #[test]
    fn month_name_dates() {
        assert_eq!(parse_report_date("Jan 7, 2020"), Ok(midnight(2020, 1, 7)));
        assert_eq!(parse_report_date("January 7th, 2020"), Ok(midnight(2020, 1, 7)));
        assert_eq!(parse_report_date("Tuesday, March 3, 2020"), Ok(midnight(2020, 3, 3)));
        assert_eq!(parse_report_date("7 Sept 2021"), Ok(midnight(2021, 9, 7)));
    }

    #[test]
    fn month_name_with_time() {
        let dt = parse_report_date("March 3, 2020 at 1:30 pm").unwrap();
        assert_eq!(dt.format("%F %T").to_string(), "2020-03-03 13:30:00");
        let dt = parse_report_date("Dec 1 2019 12:05am").unwrap();
        assert_eq!(dt.format("%F %T").to_string(), "2019-12-01 00:05:00");
    }

    #[test]
    fn unparseable_dates() {
        for raw in ["", "next tuesday", "Feb 30, 2020", "March 2020", "Jan Feb 3, 2020", "3 4 2020"] {
            assert!(
                matches!(parse_report_date(raw), Err(FieldError::UnparseableDate(_))),
                "{raw}"
            );
        }
    }
}
