//! Time-of-day helpers
//!
//! Schedules are computed in minutes since the midnight of the start day.
//! Values are never wrapped, so a route running past midnight keeps
//! counting upwards (1500 = 01:00 on the following day).

use chrono::{NaiveTime, Timelike};

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Parse `HH:MM`, `H:MM` or `HH:MM:SS`. Empty input yields `None`.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Convert NaiveTime to minutes since midnight (seconds are dropped)
pub fn time_to_minutes(time: NaiveTime) -> i32 {
    (time.num_seconds_from_midnight() / 60) as i32
}

/// Convert minutes since midnight to NaiveTime, wrapping into a single day
pub fn minutes_to_time(minutes: i32) -> NaiveTime {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY) as u32;
    NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Format minutes as `HH:MM`, with a `+Nd` suffix once past the start day.
pub fn format_minutes(minutes: i32) -> String {
    let days = minutes.div_euclid(MINUTES_PER_DAY);
    let clock = minutes_to_time(minutes).format("%H:%M");
    if days == 0 {
        clock.to_string()
    } else {
        format!("{} {:+}d", clock, days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_time_of_day("08:30"), Some(hm(8, 30)));
        assert_eq!(parse_time_of_day("8:05"), Some(hm(8, 5)));
        assert_eq!(parse_time_of_day("17:45:00"), Some(hm(17, 45)));
        assert_eq!(parse_time_of_day("  "), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn minutes_round_trip_within_day() {
        assert_eq!(time_to_minutes(hm(9, 15)), 555);
        assert_eq!(minutes_to_time(555), hm(9, 15));
    }

    #[test]
    fn format_marks_next_day() {
        assert_eq!(format_minutes(8 * 60), "08:00");
        assert_eq!(format_minutes(MINUTES_PER_DAY + 60), "01:00 +1d");
    }
}
