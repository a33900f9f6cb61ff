use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{NaiveDate, Utc};
use planner_core::focus::{focus_view_entries, progress};
use planner_core::recurrence::occurrences_between;
use planner_core::reorder::{IdOrder, OrderField, reorder};
use planner_core::selectors::{id_order_list_by_date, task_by_id};
use planner_core::{Patch, Planner};
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::datastore::{DataStore, load_patches};
use crate::datetime::parse_day_expr;
use crate::render::Renderer;

#[instrument(skip(store, planner, renderer))]
pub fn dispatch(
    command: Command,
    store: &DataStore,
    planner: &Planner,
    renderer: &Renderer,
) -> anyhow::Result<()> {
    match command {
        Command::Apply { files } => cmd_apply(store, planner, &files),
        Command::Show => {
            let state = store.load_state()?;
            renderer.print_summary(&state)
        }
        Command::Day { date } => {
            let date = parse_day(planner, &date)?;
            let state = store.load_state()?;
            let list = id_order_list_by_date(&state, date, planner.options())?;
            renderer.print_day(&state, date, &list)
        }
        Command::Occurrences { id, from, to } => {
            let from = parse_day(planner, &from)?;
            let to = parse_day(planner, &to)?;
            let state = store.load_state()?;
            let task = task_by_id(&state, &id).ok_or_else(|| anyhow!("no task with id {id}"))?;
            let metadata = task
                .repeating()
                .ok_or_else(|| anyhow!("task {id} is not a repeating task"))?;
            let days = occurrences_between(metadata, from, to, planner.options())?;
            renderer.print_occurrences(&id, &days)
        }
        Command::Reorder {
            file,
            source,
            destination,
            field,
        } => cmd_reorder(&file, source, destination, field.into()),
        Command::Focus => {
            let state = store.load_state()?;
            let entries: Vec<_> = focus_view_entries(&state)
                .into_iter()
                .filter(|entry| entry.in_focus_view || entry.in_complete_focus_view)
                .collect();
            renderer.print_focus(&state, &entries, progress(&state))
        }
    }
}

/// Applies every patch of every file against one working copy. The snapshot
/// is only replaced when all of them succeed.
#[instrument(skip(store, planner))]
fn cmd_apply(store: &DataStore, planner: &Planner, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut patches: Vec<Patch> = Vec::new();
    for file in files {
        patches.extend(load_patches(file)?);
    }

    let state = store.load_state()?;
    let next = planner
        .apply_all(&state, &patches)
        .context("patch rejected; stored state left unchanged")?;

    if next == state {
        info!(count = patches.len(), "patches produced no change");
        return Ok(());
    }

    store.save_state(&next)?;
    info!(
        count = patches.len(),
        tasks = next.tasks.len(),
        "applied patches"
    );
    Ok(())
}

#[instrument]
fn cmd_reorder(
    file: &Path,
    source: i64,
    destination: i64,
    field: OrderField,
) -> anyhow::Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let list: Vec<IdOrder> = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", file.display()))?;

    let reordered = reorder(&list, source, destination, field)?;
    debug!(items = reordered.len(), "reordered list");

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &reordered)?;
    writeln!(out)?;
    Ok(())
}

fn parse_day(planner: &Planner, input: &str) -> anyhow::Result<NaiveDate> {
    let today = planner.options().day_of(Utc::now());
    parse_day_expr(input, today)
}
