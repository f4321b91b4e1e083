//! Conversions between UTC instants and calendar days in the server's local timezone.

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, OffsetResult, PrimitiveDateTimeExt, TimeZone};

/// Get the current UTC offset of a canonical timezone, e.g. "Pacific/Auckland".
///
/// Returns `None` if `canonical_timezone` is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    get_offset_at(canonical_timezone, OffsetDateTime::now_utc())
}

/// Get the UTC offset of a canonical timezone at `instant`.
pub fn get_offset_at(canonical_timezone: &str, instant: OffsetDateTime) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&instant).to_utc())
}

/// Today's date in the local timezone.
pub fn local_today(canonical_timezone: &str) -> Option<Date> {
    let offset = get_local_offset(canonical_timezone)?;

    Some(OffsetDateTime::now_utc().to_offset(offset).date())
}

/// The calendar day in the local timezone that `instant` falls on.
pub fn local_date_of(instant: OffsetDateTime, canonical_timezone: &str) -> Option<Date> {
    let offset = get_offset_at(canonical_timezone, instant)?;

    Some(instant.to_offset(offset).date())
}

/// The instant a wall-clock time in the local timezone refers to.
///
/// A time repeated when clocks go back resolves to its first occurrence. A time
/// skipped when clocks go forward is read with the offset from before the change.
///
/// Returns `None` if `canonical_timezone` is not a known timezone.
pub fn assume_local_time(
    local_date_time: PrimitiveDateTime,
    canonical_timezone: &str,
) -> Option<OffsetDateTime> {
    let tz = time_tz::timezones::get_by_name(canonical_timezone)?;

    match local_date_time.assume_timezone(tz) {
        OffsetResult::Some(instant) => Some(instant),
        OffsetResult::Ambiguous(first, second) => Some(first.min(second)),
        OffsetResult::None => {
            let before_change = local_date_time.assume_utc() - Duration::days(1);
            let offset = tz.get_offset_utc(&before_change).to_utc();

            Some(local_date_time.assume_offset(offset))
        }
    }
}

/// The instant local midnight begins on `date`.
pub fn start_of_local_day(date: Date, canonical_timezone: &str) -> Option<OffsetDateTime> {
    assume_local_time(date.midnight(), canonical_timezone)
}
