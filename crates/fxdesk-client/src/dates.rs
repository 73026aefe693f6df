use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

const CANONICAL_FORMAT: &str = "%d/%m/%Y";

// Spreadsheet serial day 0. Anchoring one day before 1899-12-31 absorbs the
// phantom 1900-02-29 for every serial after 60.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const MAX_SERIAL: f64 = 2_958_465.0;

static ISO_DATE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$")
        .ok()
});
static YEAR_FIRST_SLASH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})$").ok());
static NUMERIC_DAY_MONTH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})([/.\-])(\d{1,2})([/.\-])(\d{4})$").ok());
static NAMED_MONTH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[\- ]([A-Za-z]{3})[\- ](\d{4})$").ok());

/// Whether `value` reads as a calendar date in one of the accepted textual layouts.
///
/// Plain numbers are never dates here; serial conversion is reserved for
/// workbook cells that carry a date type (see [`from_serial`]).
pub fn is_likely_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Re-renders a recognised date as zero-padded `DD/MM/YYYY`.
///
/// Input that is not date-like comes back unchanged.
pub fn format_to_dd_mm_yyyy(value: &str) -> String {
    match parse_date(value) {
        Some(date) => format_canonical(&date),
        None => value.to_string(),
    }
}

/// Rewrites `value` when it is date-like, otherwise returns it as given.
pub fn normalize_cell(value: &str) -> String {
    if is_likely_date(value) {
        return format_to_dd_mm_yyyy(value);
    }
    value.to_string()
}

/// Converts a spreadsheet date serial (1900 date system) to `DD/MM/YYYY`.
pub fn from_serial(serial: f64) -> Option<String> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    let whole_days = serial.floor() as i64;
    let date = epoch.checked_add_signed(Duration::days(whole_days))?;
    Some(format_canonical(&date))
}

pub fn format_canonical(date: &NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE.as_ref().and_then(|re| re.captures(trimmed)) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = YEAR_FIRST_SLASH.as_ref().and_then(|re| re.captures(trimmed)) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = NUMERIC_DAY_MONTH.as_ref().and_then(|re| re.captures(trimmed)) {
        if caps[2] != caps[4] {
            return None;
        }
        let first = caps[1].parse::<u32>().ok()?;
        let second = caps[3].parse::<u32>().ok()?;
        let year = caps[5].parse::<i32>().ok()?;
        // Day-first unless only a month-first reading is possible.
        let (day, month) = if first <= 12 && second > 12 {
            (second, first)
        } else {
            (first, second)
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = NAMED_MONTH.as_ref().and_then(|re| re.captures(trimmed)) {
        let candidate = format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
        return NaiveDate::parse_from_str(&candidate, "%d-%b-%Y").ok();
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    let day = day.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::{format_to_dd_mm_yyyy, from_serial, is_likely_date, normalize_cell};

    #[test]
    fn iso_dates_render_day_first() {
        assert_eq!(format_to_dd_mm_yyyy("2025-01-01"), "01/01/2025");
        assert_eq!(format_to_dd_mm_yyyy("2025-02-01"), "01/02/2025");
        assert_eq!(format_to_dd_mm_yyyy("2025-3-7"), "07/03/2025");
        assert_eq!(format_to_dd_mm_yyyy("2025-03-07T10:15:00Z"), "07/03/2025");
        assert_eq!(format_to_dd_mm_yyyy("2025/03/07"), "07/03/2025");
    }

    #[test]
    fn slash_dates_read_day_first_unless_impossible() {
        assert_eq!(format_to_dd_mm_yyyy("3/4/2025"), "03/04/2025");
        assert_eq!(format_to_dd_mm_yyyy("25/12/2025"), "25/12/2025");
        assert_eq!(format_to_dd_mm_yyyy("12/25/2025"), "25/12/2025");
        assert_eq!(format_to_dd_mm_yyyy("07.03.2025"), "07/03/2025");
        assert_eq!(format_to_dd_mm_yyyy("07-03-2025"), "07/03/2025");
    }

    #[test]
    fn named_month_dates_are_recognised() {
        assert_eq!(format_to_dd_mm_yyyy("5-Mar-2025"), "05/03/2025");
        assert_eq!(format_to_dd_mm_yyyy("05 mar 2025"), "05/03/2025");
    }

    #[test]
    fn non_dates_pass_through() {
        for value in ["1000", "abc", "", "INV-2025-01", "2025-13-01", "31/02/2025", "07/03-2025"] {
            assert!(!is_likely_date(value), "unexpected date: {value:?}");
            assert_eq!(normalize_cell(value), value);
        }
    }

    #[test]
    fn formatting_is_idempotent() {
        for value in [
            "2025-01-01",
            "3/4/2025",
            "12/25/2025",
            "31/01/2025",
            "05-Mar-2025",
            "2024-02-29",
        ] {
            let once = format_to_dd_mm_yyyy(value);
            assert!(is_likely_date(&once));
            assert_eq!(format_to_dd_mm_yyyy(&once), once);
        }
    }

    #[test]
    fn serials_follow_the_1900_date_system() {
        assert_eq!(from_serial(45658.0).as_deref(), Some("01/01/2025"));
        assert_eq!(from_serial(45689.75).as_deref(), Some("01/02/2025"));
        assert_eq!(from_serial(61.0).as_deref(), Some("01/03/1900"));
        assert!(from_serial(0.0).is_none());
        assert!(from_serial(f64::NAN).is_none());
        assert!(from_serial(3_000_000.0).is_none());
    }
}
