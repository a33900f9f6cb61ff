//! Decides whether a calendar day is a live occurrence of a repeating task.

use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::bitset::{DAYS_IN_MONTH, DAYS_IN_WEEK, is_bit_set};
use crate::error::{PlannerError, Result};
use crate::model::{ForkedTaskMetadata, RepeatEnd, RepeatingDate, RepeatingPattern, RepeatingTaskMetadata};
use crate::options::EngineOptions;

/// Weekly masks are indexed by day of week (Sunday = 0), monthly masks by
/// day of month directly. Monthly index 0 is never read, and the 31st lies
/// past the 31-bit width so it never matches.
pub fn date_match_repeat_pattern(date: NaiveDate, pattern: &RepeatingPattern) -> Result<bool> {
    match pattern {
        RepeatingPattern::Weekly(mask) => Ok(is_bit_set(
            *mask,
            date.weekday().num_days_from_sunday(),
            DAYS_IN_WEEK,
        )),
        RepeatingPattern::Biweekly(_) => Err(PlannerError::UnsupportedRecurrence {
            kind: pattern.kind(),
        }),
        RepeatingPattern::Monthly(mask) => Ok(is_bit_set(*mask, date.day(), DAYS_IN_MONTH)),
    }
}

/// Whether `date` hosts an occurrence of the repeating rule `repeats`,
/// given the occurrences already overridden by `forks`.
pub fn date_match_repeats(
    date: NaiveDate,
    repeats: &RepeatingDate,
    forks: &[ForkedTaskMetadata],
    options: &EngineOptions,
) -> Result<bool> {
    if forks
        .iter()
        .any(|fork| options.day_of(fork.replace_date) == date)
    {
        return Ok(false);
    }

    let start = options.day_of(repeats.start_date);
    if date < start {
        return Ok(false);
    }

    match repeats.end_date {
        RepeatEnd::Date(end) => {
            if date > options.day_of(end) {
                return Ok(false);
            }
            date_match_repeat_pattern(date, &repeats.pattern)
        }
        RepeatEnd::Count(count) => {
            if count == 0 {
                return Ok(false);
            }
            let passed = count_occurrences_before(start, date, &repeats.pattern, count, options)?;
            if passed >= count {
                return Ok(false);
            }
            date_match_repeat_pattern(date, &repeats.pattern)
        }
    }
}

/// Convenience wrapper over [`date_match_repeats`] for a master template.
pub fn task_occurs_on(
    date: NaiveDate,
    metadata: &RepeatingTaskMetadata,
    options: &EngineOptions,
) -> Result<bool> {
    date_match_repeats(date, &metadata.date, &metadata.forks, options)
}

// Counts matching days in [start, date), stopping early once `count` is
// reached. The cursor advances every day whether or not it matched.
fn count_occurrences_before(
    start: NaiveDate,
    date: NaiveDate,
    pattern: &RepeatingPattern,
    count: u32,
    options: &EngineOptions,
) -> Result<u32> {
    let mut passed = 0;
    let mut scanned = 0;
    let mut cursor = start;
    while cursor < date {
        if scanned >= options.scan_limit_days {
            return Err(PlannerError::ScanLimitExceeded {
                limit_days: options.scan_limit_days,
            });
        }
        if date_match_repeat_pattern(cursor, pattern)? {
            passed += 1;
            if passed >= count {
                break;
            }
        }
        scanned += 1;
        let Some(next) = cursor.succ_opt() else {
            break;
        };
        cursor = next;
    }
    trace!(%start, %date, passed, scanned, "counted prior occurrences");
    Ok(passed)
}

/// Every occurrence day of `metadata` within `from..=to`.
#[tracing::instrument(skip(metadata, options))]
pub fn occurrences_between(
    metadata: &RepeatingTaskMetadata,
    from: NaiveDate,
    to: NaiveDate,
    options: &EngineOptions,
) -> Result<Vec<NaiveDate>> {
    let mut out = Vec::new();
    let span = (to - from).num_days();
    if span < 0 {
        return Ok(out);
    }
    if span >= i64::from(options.scan_limit_days) {
        return Err(PlannerError::ScanLimitExceeded {
            limit_days: options.scan_limit_days,
        });
    }
    for day in from.iter_days().take_while(|day| *day <= to) {
        if task_occurs_on(day, metadata, options)? {
            out.push(day);
        }
    }
    Ok(out)
}
