use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use planner_core::options::DEFAULT_SCAN_LIMIT_DAYS;
use planner_core::{
  EngineOptions,
  MissingTaskPolicy
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::datetime::resolve_timezone;

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let plannerrc = resolve_plannerrc_path(
      rc_override
    )?;
    if let Some(path) = plannerrc {
      info!(plannerrc = %path.display(), "loading plannerrc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no plannerrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  pub fn defaults() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      "~/.planner".to_string()
    );
    map.insert(
      "recurrence.scan_limit_days"
        .to_string(),
      DEFAULT_SCAN_LIMIT_DAYS
        .to_string()
    );
    map.insert(
      "store.missing_task".to_string(),
      "fail".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  /// Engine settings derived from this
  /// configuration.
  pub fn engine_options(
    &self
  ) -> anyhow::Result<EngineOptions> {
    let scan_limit_days = match self
      .get("recurrence.scan_limit_days")
    {
      | Some(raw) => {
        raw.trim().parse().with_context(
          || {
            format!(
              "invalid \
               recurrence.scan_limit_days: \
               {raw}"
            )
          }
        )?
      }
      | None => DEFAULT_SCAN_LIMIT_DAYS
    };

    let missing_task = match self
      .get("store.missing_task")
    {
      | Some(raw) => {
        raw
          .parse::<MissingTaskPolicy>()
          .map_err(|e| anyhow!(e))?
      }
      | None => {
        MissingTaskPolicy::default()
      }
    };

    let options = EngineOptions {
      timezone: resolve_timezone(self),
      scan_limit_days,
      missing_task
    };
    debug!(?options, "resolved engine options");
    Ok(options)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_plannerrc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var("PLANNERRC")
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  let candidate = home.join(".plannerrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".planner"))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use planner_core::MissingTaskPolicy;

  use super::Config;

  #[test]
  fn loads_includes_and_overrides() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let extra = dir.path().join("extra.rc");
    fs::write(
      &extra,
      "store.missing_task = skip\n"
    )
    .expect("write include");
    let main = dir.path().join("main.rc");
    fs::write(
      &main,
      "# planner settings\n\
       recurrence.scan_limit_days = 400 # a bit over a year\n\
       include extra.rc\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(&main))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);

    let options = cfg
      .engine_options()
      .expect("engine options");
    assert_eq!(options.scan_limit_days, 400);
    assert_eq!(
      options.missing_task,
      MissingTaskPolicy::Skip
    );

    cfg.apply_overrides([(
      "rc.store.missing_task".to_string(),
      "fail".to_string()
    )]);
    assert_eq!(
      cfg
        .engine_options()
        .expect("engine options")
        .missing_task,
      MissingTaskPolicy::Fail
    );
  }

  #[test]
  fn rejects_malformed_lines() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let rc = dir.path().join("bad.rc");
    fs::write(&rc, "not a setting\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }

  #[test]
  fn rejects_bad_policy() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides([(
      "store.missing_task".to_string(),
      "maybe".to_string()
    )]);
    assert!(cfg.engine_options().is_err());
  }
}
