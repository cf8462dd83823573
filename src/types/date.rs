use crate::error::StoreError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const SORTABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LOCALE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";
/// ja-JP browser rendering, e.g. `2024/1/5 15:04:00`. Accepted on read only.
const JA_JP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Text rendering used for `LIMIT_DATE`. Both drop sub-second precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateEncoding {
    /// `2024-01-31 09:05:00`. Lexicographic order is chronological.
    #[default]
    Sortable,
    /// `1/31/2024, 9:05:00 AM`, the en-US rendering written by the browser app.
    /// `ORDER BY LIMIT_DATE` is not chronological under this encoding.
    Locale,
}

impl DateEncoding {
    fn format(self) -> &'static str {
        match self {
            DateEncoding::Sortable => SORTABLE_FORMAT,
            DateEncoding::Locale => LOCALE_FORMAT,
        }
    }

    pub fn encode(self, value: &NaiveDateTime) -> String {
        value.format(self.format()).to_string()
    }

    /// Parses text in this encoding, falling back to the other one and to
    /// the ja-JP rendering so files written under any of them stay readable.
    pub fn decode(self, text: &str) -> Result<NaiveDateTime, StoreError> {
        let fallback = match self {
            DateEncoding::Sortable => DateEncoding::Locale,
            DateEncoding::Locale => DateEncoding::Sortable,
        };
        [self.format(), fallback.format(), JA_JP_FORMAT]
            .into_iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .ok_or_else(|| StoreError::InvalidDate(text.to_string()))
    }
}

/// Parses a user-supplied due date: `YYYY-MM-DD`, optionally followed by
/// `HH:MM` or `HH:MM:SS` (space or `T` separated).
pub fn parse_due_date(text: &str) -> Result<NaiveDateTime, StoreError> {
    let text = text.trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| StoreError::InvalidDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_milli_opt(21, 5, 9, 750)
            .unwrap()
    }

    #[test]
    fn sortable_encoding_truncates_to_seconds() {
        let text = DateEncoding::Sortable.encode(&sample());
        assert_eq!(text, "2024-01-31 21:05:09");
        let back = DateEncoding::Sortable.decode(&text).unwrap();
        assert_eq!(back, sample().with_nanosecond(0).unwrap());
    }

    #[test]
    fn locale_encoding_matches_browser_rendering() {
        let text = DateEncoding::Locale.encode(&sample());
        assert_eq!(text, "1/31/2024, 9:05:09 PM");
        let back = DateEncoding::Locale.decode(&text).unwrap();
        assert_eq!(back, sample().with_nanosecond(0).unwrap());
    }

    #[test]
    fn decode_accepts_the_other_encoding() {
        let back = DateEncoding::Sortable.decode("1/1/2024, 12:00:00 AM").unwrap();
        assert_eq!(back, parse_due_date("2024-01-01").unwrap());
    }

    #[test]
    fn decode_accepts_ja_jp_rendering() {
        for encoding in [DateEncoding::Sortable, DateEncoding::Locale] {
            let back = encoding.decode("2024/1/5 15:04:00").unwrap();
            assert_eq!(back, parse_due_date("2024-01-05 15:04:00").unwrap());
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            DateEncoding::Sortable.decode("next tuesday"),
            Err(StoreError::InvalidDate(_))
        ));
    }

    #[test]
    fn due_date_forms() {
        let midnight = parse_due_date("2024-03-05").unwrap();
        assert_eq!(midnight.hour(), 0);
        let minutes = parse_due_date("2024-03-05T08:30").unwrap();
        assert_eq!((minutes.hour(), minutes.minute()), (8, 30));
        assert!(parse_due_date("05/03/2024").is_err());
    }
}
