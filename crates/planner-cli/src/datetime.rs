use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Days,
  NaiveDate,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;

const TIMEZONE_CONFIG_FILE: &str =
  "planner-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "PLANNER_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "PLANNER_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Resolves the zone used to turn task
/// instants into calendar days: env
/// var, then the `timezone` rc key, then
/// `planner-time.toml`, then UTC.
pub fn resolve_timezone(
  cfg: &Config
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(raw) = cfg.get("timezone")
    && let Some(tz) =
      parse_timezone(&raw, "rc")
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no timezone configured; using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

pub(crate) fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured planner timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Parses a calendar day relative to
/// `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_day_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!("date out of range")
        });
    }
    | "yesterday" => {
      return today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!("date out of range")
        });
    }
    | _ => {}
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today, target
    ));
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let num: u64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let days = match caps
      .name("unit")
      .map(|m| m.as_str())
    {
      | Some("d") => num,
      | Some("w") => {
        num.saturating_mul(7)
      }
      | other => {
        return Err(anyhow!(
          "unknown relative unit: \
           {other:?}"
        ));
      }
    };
    let shifted = if caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-")
    {
      today.checked_sub_days(
        Days::new(days)
      )
    } else {
      today.checked_add_days(
        Days::new(days)
      )
    };
    return shifted.ok_or_else(|| {
      anyhow!("date out of range")
    });
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "unrecognized day expression: \
       {input} (supported: \
       today/tomorrow/yesterday, \
       weekday names, +Nd/-Nw, \
       YYYY-MM-DD)"
    )
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

// Strictly after `today`: "monday" on a
// Monday means the following week.
fn next_weekday_date(
  today: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let current = today
    .weekday()
    .num_days_from_monday();
  let wanted =
    target.num_days_from_monday();
  let mut delta =
    (7 + wanted - current) % 7;
  if delta == 0 {
    delta = 7;
  }
  today
    + Days::new(u64::from(delta))
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use chrono::NaiveDate;

  use super::{
    load_timezone_from_file,
    parse_day_expr
  };

  fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(
      2026, 10, 19
    )
    .expect("valid date")
  }

  #[test]
  fn parses_named_days() {
    assert_eq!(
      parse_day_expr("today", monday())
        .expect("today"),
      monday()
    );
    assert_eq!(
      parse_day_expr(
        "Tomorrow",
        monday()
      )
      .expect("tomorrow")
      .to_string(),
      "2026-10-20"
    );
    assert_eq!(
      parse_day_expr("fri", monday())
        .expect("weekday")
        .to_string(),
      "2026-10-23"
    );
    assert_eq!(
      parse_day_expr(
        "monday",
        monday()
      )
      .expect("weekday")
      .to_string(),
      "2026-10-26"
    );
  }

  #[test]
  fn parses_offsets_and_iso() {
    assert_eq!(
      parse_day_expr("+3d", monday())
        .expect("offset")
        .to_string(),
      "2026-10-22"
    );
    assert_eq!(
      parse_day_expr("-1w", monday())
        .expect("offset")
        .to_string(),
      "2026-10-12"
    );
    assert_eq!(
      parse_day_expr(
        "2027-01-31",
        monday()
      )
      .expect("iso")
      .to_string(),
      "2027-01-31"
    );
    assert!(
      parse_day_expr(
        "someday",
        monday()
      )
      .is_err()
    );
  }

  #[test]
  fn reads_timezone_from_toml() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      "[time]\ntimezone = \"America/New_York\""
    )
    .expect("write");
    assert_eq!(
      load_timezone_from_file(
        file.path()
      ),
      Some(
        chrono_tz::America::New_York
      )
    );
  }
}
