use anyhow::Result;
use chrono::{Days, NaiveDate};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn to_date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    if !is_date_key(key) {
        bail!("not a date key: {:?}", key);
    }
    Ok(NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)?)
}

/// `days_ago` days before `today`, as a date key.
pub fn date_key_days_ago(today: NaiveDate, days_ago: u64) -> String {
    let date = today.checked_sub_days(Days::new(days_ago)).unwrap_or(today);
    to_date_key(date)
}

// Shape check only: `dddd-dd-dd`. Keys like "2024-13-45" still count as
// date keys so that `clear_all` removes them.
pub fn is_date_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
