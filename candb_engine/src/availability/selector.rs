use std::fmt::Display;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};

use crate::availability::AvailabilityError;

/// Monday is 0, Sunday is 6.
pub const MAX_WEEKDAY: u8 = 6;

/// When an availability entry applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSelector {
    /// Applies to instants in `[start, end]`. The bounds keep their UTC offsets.
    DateTimeRange(DateTime<FixedOffset>, DateTime<FixedOffset>),
    /// Applies to every instant whose calendar date falls in `[start, end]`.
    DateRange(NaiveDate, NaiveDate),
    /// Applies to every instant whose weekday falls in `[start, end]`, with Monday = 0. Ranges do not wrap around.
    WeekdayRange(u8, u8),
    /// The fallback entry. Never matched directly; the engine uses it when nothing else applies.
    Default,
}

impl TimeSelector {
    pub fn weekdays(start: u8, end: u8) -> Result<Self, AvailabilityError> {
        let selector = Self::WeekdayRange(start, end);
        selector.validate()?;
        Ok(selector)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Checks that the selector has a well-formed shape. Only weekday ranges can be malformed once constructed.
    pub fn validate(&self) -> Result<(), AvailabilityError> {
        match self {
            Self::WeekdayRange(start, end) if *start > MAX_WEEKDAY || *end > MAX_WEEKDAY => {
                Err(AvailabilityError::InvalidSelectorKind(format!(
                    "weekday range ({start}, {end}) must use values between 0 and {MAX_WEEKDAY}"
                )))
            },
            _ => Ok(()),
        }
    }

    /// Decides whether `instant` falls inside this window. Both ends of every range are inclusive.
    ///
    /// Date and weekday ranges are evaluated against the calendar date of `instant` in its own offset, so pass the
    /// instant in the store's timezone.
    ///
    /// Calling this on [`TimeSelector::Default`] fails with `InvalidSelectorKind`: the default entry is not a window and
    /// is handled by the engine.
    pub fn matches(&self, instant: &DateTime<FixedOffset>) -> Result<bool, AvailabilityError> {
        self.validate()?;
        match self {
            Self::DateTimeRange(start, end) => Ok(start <= instant && instant <= end),
            Self::DateRange(start, end) => {
                let date = instant.date_naive();
                Ok(*start <= date && date <= *end)
            },
            Self::WeekdayRange(start, end) => {
                let weekday = instant.weekday().num_days_from_monday();
                Ok(u32::from(*start) <= weekday && weekday <= u32::from(*end))
            },
            Self::Default => Err(AvailabilityError::InvalidSelectorKind(
                "the default selector is not a time window and cannot be matched".to_string(),
            )),
        }
    }
}

impl Display for TimeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DateTimeRange(start, end) => write!(f, "[{} .. {}]", start.to_rfc3339(), end.to_rfc3339()),
            Self::DateRange(start, end) => write!(f, "[{start} .. {end}]"),
            Self::WeekdayRange(start, end) => write!(f, "weekdays [{start} .. {end}]"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn tz(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    // 2024-03-13 is a Wednesday (weekday 2)
    fn wednesday_noon() -> DateTime<FixedOffset> {
        tz(10).with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap()
    }

    #[test]
    fn datetime_range_is_inclusive() {
        let start = tz(10).with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();
        let end = tz(10).with_ymd_and_hms(2024, 3, 13, 18, 0, 0).unwrap();
        let selector = TimeSelector::DateTimeRange(start, end);
        assert!(selector.matches(&start).unwrap());
        assert!(selector.matches(&end).unwrap());
        assert!(!selector.matches(&(end + chrono::Duration::seconds(1))).unwrap());
        assert!(!selector.matches(&(start - chrono::Duration::seconds(1))).unwrap());
    }

    #[test]
    fn datetime_range_compares_instants_across_offsets() {
        let start = tz(0).with_ymd_and_hms(2024, 3, 13, 1, 0, 0).unwrap();
        let end = tz(0).with_ymd_and_hms(2024, 3, 13, 3, 0, 0).unwrap();
        let selector = TimeSelector::DateTimeRange(start, end);
        // 12:00 at +10:00 is 02:00 UTC
        assert!(selector.matches(&wednesday_noon()).unwrap());
    }

    #[test]
    fn date_range_uses_the_calendar_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        let selector = TimeSelector::DateRange(day, day);
        assert!(selector.matches(&wednesday_noon()).unwrap());
        let late = tz(10).with_ymd_and_hms(2024, 3, 13, 23, 59, 59).unwrap();
        assert!(selector.matches(&late).unwrap());
        let next = tz(10).with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();
        assert!(!selector.matches(&next).unwrap());
    }

    #[test]
    fn weekday_range() {
        let now = wednesday_noon();
        assert!(TimeSelector::weekdays(0, 2).unwrap().matches(&now).unwrap());
        assert!(TimeSelector::weekdays(2, 2).unwrap().matches(&now).unwrap());
        assert!(TimeSelector::weekdays(2, 6).unwrap().matches(&now).unwrap());
        assert!(!TimeSelector::weekdays(3, 6).unwrap().matches(&now).unwrap());
        assert!(!TimeSelector::weekdays(0, 1).unwrap().matches(&now).unwrap());
        // ranges do not wrap past Sunday
        assert!(!TimeSelector::weekdays(5, 1).unwrap().matches(&now).unwrap());
    }

    #[test]
    fn malformed_selectors() {
        assert!(matches!(TimeSelector::weekdays(0, 7), Err(AvailabilityError::InvalidSelectorKind(_))));
        let raw = TimeSelector::WeekdayRange(9, 12);
        assert!(matches!(raw.matches(&wednesday_noon()), Err(AvailabilityError::InvalidSelectorKind(_))));
        assert!(matches!(
            TimeSelector::Default.matches(&wednesday_noon()),
            Err(AvailabilityError::InvalidSelectorKind(_))
        ));
    }
}
