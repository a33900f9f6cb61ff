use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use planner_core::State;
use planner_core::focus::{FocusViewEntry, TasksProgress};
use planner_core::reorder::IdOrder;
use planner_core::selectors::{ordered_tags, tag_by_id};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    /// Tasks listed for one calendar day, in display order.
    #[tracing::instrument(skip(self, state, list))]
    pub fn print_day(&self, state: &State, date: NaiveDate, list: &[IdOrder]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.paint(&date.format("%A %Y-%m-%d").to_string(), "1"))?;

        let headers = vec![
            "Order".to_string(),
            "ID".to_string(),
            "Name".to_string(),
            "Tag".to_string(),
            "Done".to_string(),
        ];

        let rows = list
            .iter()
            .filter_map(|item| state.tasks.get(&item.id).map(|task| (item.order, task)))
            .map(|(order, task)| {
                let tag = tag_by_id(state, &task.tag);
                let done = if task.complete {
                    self.paint("yes", "32")
                } else {
                    String::new()
                };
                vec![
                    order.to_string(),
                    self.paint(&task.id, "33"),
                    task.name.clone(),
                    tag.name.clone(),
                    done,
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)
    }

    #[tracing::instrument(skip(self, state, entries, progress))]
    pub fn print_focus(
        &self,
        state: &State,
        entries: &[FocusViewEntry],
        progress: TasksProgress,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Order".to_string(),
            "ID".to_string(),
            "Name".to_string(),
            "Pending".to_string(),
            "Completed".to_string(),
        ];

        let mark = |flag: bool| if flag { "*".to_string() } else { String::new() };
        let rows = entries
            .iter()
            .map(|entry| {
                let name = state
                    .tasks
                    .get(&entry.id)
                    .map(|task| task.name.clone())
                    .unwrap_or_default();
                vec![
                    entry.order.to_string(),
                    self.paint(&entry.id, "33"),
                    name,
                    mark(entry.in_focus_view),
                    mark(entry.in_complete_focus_view),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        writeln!(
            out,
            "\n{} of {} focused tasks completed",
            progress.completed_tasks_count, progress.all_tasks_count
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, days))]
    pub fn print_occurrences(&self, id: &str, days: &[NaiveDate]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        if days.is_empty() {
            writeln!(out, "{id}: no occurrences in range")?;
            return Ok(());
        }
        for day in days {
            writeln!(out, "{}  {}", day.format("%Y-%m-%d"), day.format("%a"))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, state))]
    pub fn print_summary(&self, state: &State) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "tasks           {}", state.tasks.len())?;
        writeln!(out, "dated days      {}", state.date_task_map.len())?;
        writeln!(out, "repeating       {}", state.repeated_task_set.len())?;
        writeln!(out, "group tasks     {}", state.group_task_set.len())?;
        writeln!(out, "courses         {}", state.courses.len())?;
        writeln!(out, "groups          {}", state.groups.len())?;
        writeln!(out, "invites         {}", state.group_invites.len())?;
        writeln!(out, "theme           {:?}", state.settings.theme)?;

        let tags = ordered_tags(state)
            .into_iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "tags            {tags}")?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, &width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths).take(column_count) {
            let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
