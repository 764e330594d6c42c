use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));
static DAY_FIRST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{4}$").expect("valid regex"));

/// `DD-MM-YYYY` becomes `YYYY-MM-DD`; anything other than ASCII-digit dashed
/// dates passes through unchanged.
pub fn normalize_date_format(date: &str) -> String {
    if YEAR_FIRST.is_match(date) {
        return date.to_string();
    }
    if DAY_FIRST.is_match(date) {
        let mut parts = date.split('-');
        if let (Some(dd), Some(mm), Some(yyyy)) = (parts.next(), parts.next(), parts.next()) {
            return format!("{yyyy}-{mm}-{dd}");
        }
    }
    tracing::warn!(date = %date, "unrecognized date format");
    date.to_string()
}

pub fn convert_to_calendar_format(date: &str) -> String {
    if !date.contains('-') {
        return date.to_string();
    }
    let parts = date.split('-').collect::<Vec<_>>();
    if parts.len() < 3 {
        return date.to_string();
    }
    if parts[0].len() == 4 {
        format!("{}-{}-{}", parts[0], parts[1], parts[2])
    } else {
        format!("{}-{}-{}", parts[2], parts[1], parts[0])
    }
}

pub fn compose_start(date: &str, time: &str) -> Option<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time.trim();
    let clock = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Some(day.and_time(clock))
}

#[cfg(test)]
mod tests {
    use super::{compose_start, convert_to_calendar_format, normalize_date_format};
    use chrono::NaiveDate;

    #[test]
    fn day_first_dates_are_rewritten() {
        assert_eq!(normalize_date_format("15-03-2025"), "2025-03-15");
    }

    #[test]
    fn canonical_dates_are_a_fixed_point() {
        assert_eq!(normalize_date_format("2025-03-15"), "2025-03-15");
        let once = normalize_date_format("15-03-2025");
        assert_eq!(normalize_date_format(&once), once);
    }

    #[test]
    fn unrecognized_dates_pass_through() {
        assert_eq!(normalize_date_format("March 15"), "March 15");
        assert_eq!(normalize_date_format("2025/03/15"), "2025/03/15");
        assert_eq!(normalize_date_format(""), "");
    }

    #[test]
    fn non_ascii_digits_are_not_rewritten() {
        assert_eq!(normalize_date_format("١٥-٠٣-٢٠٢٥"), "١٥-٠٣-٢٠٢٥");
        assert_eq!(normalize_date_format("٢٠٢٥-٠٣-١٥"), "٢٠٢٥-٠٣-١٥");
        assert_eq!(normalize_date_format("１５-０３-２０２５"), "１５-０３-２０２５");
    }

    #[test]
    fn calendar_format_detects_year_first() {
        assert_eq!(convert_to_calendar_format("2025-03-15"), "2025-03-15");
        assert_eq!(convert_to_calendar_format("15-03-2025"), "2025-03-15");
        assert_eq!(convert_to_calendar_format("20250315"), "20250315");
        assert_eq!(convert_to_calendar_format("15-03"), "15-03");
    }

    #[test]
    fn start_is_composed_from_date_and_time() {
        let start = compose_start("2025-01-01", "10:30").expect("valid start");
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|day| day.and_hms_opt(10, 30, 0))
            .expect("valid date");
        assert_eq!(start, expected);
        assert!(compose_start("2025-01-01", "").is_none());
        assert!(compose_start("01-01-2025", "10:30").is_none());
        assert!(compose_start("2025-13-01", "10:30").is_none());
    }
}
