use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Default cap on the day-by-day walk of count-terminated recurrences,
/// roughly a century.
pub const DEFAULT_SCAN_LIMIT_DAYS: u32 = 36_600;

/// What the store does when an edit or delete names a task it does not hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingTaskPolicy {
    /// Abort the whole patch with an invariant violation.
    #[default]
    Fail,
    /// Drop the offending item, log a warning, and apply the rest.
    Skip,
}

impl std::str::FromStr for MissingTaskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown missing-task policy: {other}")),
        }
    }
}

/// Everything the engine needs from the outside world, passed by value so
/// that every engine call stays a pure function of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub timezone: Tz,
    pub scan_limit_days: u32,
    pub missing_task: MissingTaskPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            scan_limit_days: DEFAULT_SCAN_LIMIT_DAYS,
            missing_task: MissingTaskPolicy::Fail,
        }
    }
}

impl EngineOptions {
    /// Calendar day of an instant in the configured timezone.
    #[must_use]
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }
}
