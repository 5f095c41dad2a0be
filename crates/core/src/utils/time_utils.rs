use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Default timezone for valuation dates.
/// Trade timestamps are UTC instants; UTC keeps a trade booked at midnight on the
/// calendar day it was entered for.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::UTC;

/// Converts a UTC instant to a valuation date in the given timezone.
///
/// This is the single source of truth for converting instants to domain dates.
/// Use this whenever you need to derive a "business date" from a timestamp.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Returns the last representable instant of `date` in `tz`, as UTC.
///
/// Used to turn an "as of" calendar day into an inclusive timestamp bound.
pub fn end_of_day_utc(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let local = date
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, latest) => latest.with_timezone(&Utc),
        // Midnight-adjacent DST gaps: fall back to treating the wall clock as UTC.
        LocalResult::None => Utc.from_utc_datetime(&local),
    }
}
