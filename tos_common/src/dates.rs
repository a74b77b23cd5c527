use chrono::{DateTime, NaiveDate, Utc};

/// Calendar-date format used in API responses and notification emails.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn format_display_datetime(ts: DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y %H:%M:%S").to_string()
}
