use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

/// Canonical "not yet scheduled" stamp. Anything before year 2000 is treated
/// as unscheduled rather than a real window boundary.
pub(crate) const SENTINEL_YEAR_CUTOFF: i32 = 2000;

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn sentinel_time() -> PrimitiveDateTime {
    let epoch = OffsetDateTime::UNIX_EPOCH;
    PrimitiveDateTime::new(epoch.date(), epoch.time())
}

pub(crate) fn is_unscheduled(value: PrimitiveDateTime) -> bool {
    value.year() < SENTINEL_YEAR_CUTOFF
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn sentinel_is_unscheduled() {
        assert!(is_unscheduled(sentinel_time()));
        assert_eq!(format_primitive(sentinel_time()), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn real_times_are_scheduled() {
        let date = Date::from_calendar_date(2000, time::Month::January, 1).unwrap();
        let value = PrimitiveDateTime::new(date, Time::MIDNIGHT);
        assert!(!is_unscheduled(value));
    }
}
