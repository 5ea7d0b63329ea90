use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Accepts the timestamp spellings the two data sources actually produce:
/// RFC 3339 from the remote store, bare dates from spreadsheet rows, and the
/// locale-style strings older records carry.
pub fn parse_flexible(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y, %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&parsed.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

/// Display form used by the dashboard's date columns.
pub fn locale_date(instant: DateTime<Utc>) -> String {
    instant.format("%m/%d/%Y").to_string()
}

/// Display form used by the dashboard's date-time columns.
pub fn locale_date_time(instant: DateTime<Utc>) -> String {
    instant.format("%m/%d/%Y, %H:%M:%S").to_string()
}
