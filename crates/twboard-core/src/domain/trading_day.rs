use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset, Weekday};

const COMPACT: &[FormatItem<'_>] = format_description!("[year][month][day]");

/// The exchange publishes dates in Taipei local time.
const TAIPEI_OFFSET_HOURS: i8 = 8;

/// Previous trading day: one calendar day back, then skip backward over the
/// weekend. Holidays are not consulted; a closed weekday simply costs one
/// fallback attempt.
pub fn previous_trading_day(date: Date) -> Date {
    let mut day = date - Duration::days(1);
    match day.weekday() {
        Weekday::Sunday => day -= Duration::days(2),
        Weekday::Saturday => day -= Duration::days(1),
        _ => {}
    }
    day
}

/// Today's calendar date at the exchange (UTC+8).
pub fn market_today() -> Date {
    let offset =
        UtcOffset::from_hms(TAIPEI_OFFSET_HOURS, 0, 0).unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

/// Format a date as the upstream `YYYYMMDD` parameter.
pub fn format_compact(date: Date) -> String {
    date.format(&COMPACT)
        .unwrap_or_else(|_| String::from("00000000"))
}

/// Parse a `YYYYMMDD` string back into a date.
pub fn parse_compact(value: &str) -> Option<Date> {
    Date::parse(value, &COMPACT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn steps_back_one_weekday() {
        assert_eq!(
            previous_trading_day(date!(2024 - 06 - 13)),
            date!(2024 - 06 - 12)
        );
    }

    #[test]
    fn monday_steps_back_to_friday() {
        assert_eq!(
            previous_trading_day(date!(2024 - 06 - 17)),
            date!(2024 - 06 - 14)
        );
    }

    #[test]
    fn sunday_steps_back_to_friday() {
        assert_eq!(
            previous_trading_day(date!(2024 - 06 - 16)),
            date!(2024 - 06 - 14)
        );
    }

    #[test]
    fn never_returns_a_weekend_day() {
        let mut day = date!(2024 - 01 - 01);
        for _ in 0..366 {
            let previous = previous_trading_day(day);
            assert!(
                previous.weekday() != Weekday::Saturday
                    && previous.weekday() != Weekday::Sunday,
                "{previous} is a weekend day"
            );
            day += Duration::days(1);
        }
    }

    #[test]
    fn compact_format_round_trips() {
        let day = date!(2024 - 06 - 03);
        assert_eq!(format_compact(day), "20240603");
        assert_eq!(parse_compact("20240603"), Some(day));
        assert_eq!(parse_compact("2024-06-03"), None);
    }
}
