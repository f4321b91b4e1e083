//! Half-open time windows used to filter transactions by date.

use time::{Date, Month, OffsetDateTime, macros::format_description};

use crate::{
    Error,
    db::to_timestamp,
    timezone::{local_today, start_of_local_day},
};

/// A span of time `[start, end)`, where a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    /// The first instant inside the window.
    pub start: Option<OffsetDateTime>,
    /// The first instant after the window.
    pub end: Option<OffsetDateTime>,
}

impl TimeWindow {
    /// A window covering all time.
    pub fn all_time() -> Self {
        Self::default()
    }

    /// A window covering the local calendar days `start` to `end`, both inclusive.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `start` is after `end`, or
    /// [Error::InvalidTimezoneError] if `local_timezone` is not a valid timezone.
    pub fn from_local_dates(
        start: Option<Date>,
        end: Option<Date>,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(Error::InvalidDateRange);
        }

        let start = start
            .map(|date| local_midnight(date, local_timezone))
            .transpose()?;
        let end = end
            .map(|date| match date.next_day() {
                Some(next_day) => local_midnight(next_day, local_timezone).map(Some),
                None => Ok(None),
            })
            .transpose()?
            .flatten();

        Ok(Self { start, end })
    }

    /// A window covering the calendar month that starts on `first_day`.
    pub fn month(first_day: Date, local_timezone: &str) -> Result<Self, Error> {
        let start = local_midnight(first_day, local_timezone)?;
        let end = local_midnight(next_month(first_day), local_timezone)?;

        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// A window covering the current calendar month in the local timezone.
    pub fn current_month(local_timezone: &str) -> Result<Self, Error> {
        let today = local_today(local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))?;

        Self::month(first_of_month(today), local_timezone)
    }

    /// The start bound as a stored timestamp.
    pub fn start_timestamp(&self) -> Option<i64> {
        self.start.map(to_timestamp)
    }

    /// The end bound as a stored timestamp.
    pub fn end_timestamp(&self) -> Option<i64> {
        self.end.map(to_timestamp)
    }

    /// Whether `instant` falls inside the window.
    #[cfg(test)]
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant < end)
    }
}

fn local_midnight(date: Date, local_timezone: &str) -> Result<OffsetDateTime, Error> {
    start_of_local_day(date, local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))
}

/// The first day of the month `date` falls in.
pub fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// The first day of the month after the month `date` falls in.
pub fn next_month(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };

    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}

/// The first day of the month before the month `date` falls in.
pub fn previous_month(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::January => (date.year() - 1, Month::December),
        month => (date.year(), month.previous()),
    };

    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}

/// Parse an optional `YYYY-MM-DD` query parameter.
///
/// Empty strings are treated as missing.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<Date>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map(Some)
            .map_err(|_| Error::InvalidDate(raw.to_owned())),
    }
}
