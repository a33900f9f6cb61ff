use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use planner_core::{Patch, State};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Snapshot of the planner state kept on disk between invocations.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub state_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let state_path = data_dir.join("state.json");

        info!(
            data_dir = %data_dir.display(),
            state = %state_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            state_path,
        })
    }

    /// Loads the snapshot, or the initial state when none was saved yet.
    #[tracing::instrument(skip(self))]
    pub fn load_state(&self) -> anyhow::Result<State> {
        if !self.state_path.exists() {
            debug!("no snapshot yet; starting from initial state");
            return Ok(State::default());
        }
        let raw = fs::read_to_string(&self.state_path)
            .with_context(|| format!("failed reading {}", self.state_path.display()))?;
        if raw.trim().is_empty() {
            return Ok(State::default());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.state_path.display()))
    }

    #[tracing::instrument(skip(self, state), fields(tasks = state.tasks.len()))]
    pub fn save_state(&self, state: &State) -> anyhow::Result<()> {
        let dir = self.state_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, state)?;
        writeln!(temp)?;
        temp.flush()?;
        temp.persist(&self.state_path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.state_path.display(), err))?;
        Ok(())
    }
}

/// Reads one patch per non-empty line.
#[tracing::instrument]
pub fn load_patches(path: &Path) -> anyhow::Result<Vec<Patch>> {
    debug!(file = %path.display(), "loading patches");
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let patch: Patch = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(patch);
    }

    debug!(count = out.len(), "loaded patches");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use planner_core::Planner;

    use super::*;

    #[test]
    fn snapshot_roundtrip_with_patches() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        assert_eq!(store.load_state().expect("initial"), State::default());

        let patches = temp.path().join("patches.jsonl");
        fs::write(
            &patches,
            concat!(
                r#"{"type":"PATCH_TASKS","created":[{"id":"hw","order":1,"name":"HW 3","tag":"NONE","complete":false,"inFocus":true,"metadata":{"type":"ONE_TIME","date":"2026-10-21T23:59:00Z"}}]}"#,
                "\n\n",
                r#"{"type":"PATCH_SETTINGS","settings":{"canvasCalendar":null,"completedOnboarding":false,"theme":"dark"}}"#,
                "\n"
            ),
        )
        .expect("write patches");

        let loaded = load_patches(&patches).expect("load patches");
        assert_eq!(loaded.len(), 2);

        let state = Planner::default()
            .apply_all(&store.load_state().expect("state"), &loaded)
            .expect("apply");
        store.save_state(&state).expect("save");

        let reloaded = store.load_state().expect("reload");
        assert_eq!(reloaded, state);
        assert!(reloaded.tasks.contains_key("hw"));
    }

    #[test]
    fn reports_bad_line_number() {
        let temp = tempfile::tempdir().expect("tempdir");
        let patches = temp.path().join("bad.jsonl");
        fs::write(&patches, "{\"type\":\"PATCH_TAGS\"}\nnot json\n").expect("write");
        let err = load_patches(&patches).expect_err("second line is invalid");
        assert!(format!("{err:#}").contains("line 2"));
    }
}
