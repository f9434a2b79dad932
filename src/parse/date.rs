use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Check the `YYYY-MM-DD` shape without validating the calendar date.
fn has_date_shape(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a `YYYY-MM-DD` token into a timestamp at UTC midnight.
/// Returns None for anything that is not a real calendar date.
pub fn parse_date_token(token: &str) -> Option<DateTime<Utc>> {
    if !has_date_shape(token) {
        return None;
    }
    let date = NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Render a timestamp as its UTC calendar date, `YYYY-MM-DD`.
///
/// Only years 0000 through 9999 have a four-digit form that parses back;
/// dates outside that range clamp to its first or last day.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    let date = ts.date_naive();
    match date.year() {
        year if year > 9999 => "9999-12-31".to_string(),
        year if year < 0 => "0000-01-01".to_string(),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}
