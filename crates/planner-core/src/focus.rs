//! Focus view filtering and progress.
//!
//! A task shows up in the focus view when it is itself in focus, or when
//! at least one of its subtasks is. The view is split into a "not yet
//! completed" part and a "completed" part; one task can appear in both.

use serde::{Deserialize, Serialize};

use crate::model::{State, SubTask, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksProgress {
    pub completed_tasks_count: usize,
    pub all_tasks_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusViewEntry {
    pub id: String,
    pub order: i64,
    pub in_focus_view: bool,
    pub in_complete_focus_view: bool,
}

fn with_children(task: &Task, mut children: Vec<SubTask>) -> Task {
    children.sort_by_key(|child| child.order);
    Task {
        children,
        ..task.clone()
    }
}

fn select_children(task: &Task, keep: impl Fn(&SubTask) -> bool) -> Vec<SubTask> {
    task.children.iter().filter(|s| keep(s)).cloned().collect()
}

/// The task restricted to what belongs in the "not completed" focus list.
pub fn filtered_not_completed_in_focus_task(task: &Task) -> Option<Task> {
    if task.in_focus {
        if task.complete {
            return None;
        }
        return Some(with_children(task, select_children(task, |s| !s.complete)));
    }
    if task.complete {
        return None;
    }
    let children = select_children(task, |s| s.in_focus && !s.complete);
    if children.is_empty() {
        return None;
    }
    Some(with_children(task, children))
}

/// The task restricted to what belongs in the "completed" focus list.
pub fn filtered_completed_in_focus_task(task: &Task) -> Option<Task> {
    let children = if task.in_focus {
        if task.complete {
            return Some(with_children(task, task.children.clone()));
        }
        select_children(task, |s| s.complete)
    } else {
        select_children(task, |s| s.in_focus && (task.complete || s.complete))
    };
    if children.is_empty() {
        return None;
    }
    Some(with_children(task, children))
}

/// Counts items (tasks and subtasks) in focus and how many are done.
pub fn compute_task_progress<'a, I>(in_focus_tasks: I) -> TasksProgress
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut progress = TasksProgress::default();
    for task in in_focus_tasks {
        let counted = |s: &&SubTask| task.in_focus || s.in_focus;
        if task.in_focus {
            progress.all_tasks_count += task.children.len() + 1;
        } else {
            progress.all_tasks_count += task.children.iter().filter(|s| s.in_focus).count();
        }
        if task.complete {
            progress.completed_tasks_count +=
                task.children.iter().filter(counted).count() + usize::from(task.in_focus);
        } else {
            progress.completed_tasks_count += task
                .children
                .iter()
                .filter(counted)
                .filter(|s| s.complete)
                .count();
        }
    }
    progress
}

pub fn is_in_focus(task: &Task) -> bool {
    task.in_focus || task.children.iter().any(|s| s.in_focus)
}

pub fn tasks_in_focus(state: &State) -> Vec<&Task> {
    state.tasks.values().filter(|t| is_in_focus(t)).collect()
}

pub fn progress(state: &State) -> TasksProgress {
    compute_task_progress(tasks_in_focus(state))
}

/// One entry per (task, focus list) pair the task appears in, or a single
/// `in_focus_view = false` entry for tasks outside the view.
pub fn focus_view_entries(state: &State) -> Vec<FocusViewEntry> {
    let mut entries = Vec::with_capacity(state.tasks.len());
    for task in state.tasks.values() {
        let entry = |in_focus_view, in_complete_focus_view| FocusViewEntry {
            id: task.id.clone(),
            order: task.order.focus,
            in_focus_view,
            in_complete_focus_view,
        };
        let completed = filtered_completed_in_focus_task(task).is_some();
        let not_completed = filtered_not_completed_in_focus_task(task).is_some();
        if completed {
            entries.push(entry(true, true));
        }
        if not_completed {
            entries.push(entry(true, false));
        }
        if !completed && !not_completed {
            entries.push(entry(false, false));
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{OrderKeys, TaskMetadata};

    fn sub(order: i64, complete: bool, in_focus: bool) -> SubTask {
        SubTask {
            order,
            name: format!("sub {order}"),
            complete,
            in_focus,
        }
    }

    fn task(complete: bool, in_focus: bool, children: Vec<SubTask>) -> Task {
        Task {
            id: "t".to_string(),
            order: OrderKeys::new(1),
            owner: vec![],
            name: "t".to_string(),
            tag: "NONE".to_string(),
            complete,
            in_focus,
            children,
            metadata: TaskMetadata::OneTime {
                date: Utc
                    .with_ymd_and_hms(2026, 10, 19, 0, 0, 0)
                    .single()
                    .expect("valid instant"),
                ical_uid: None,
            },
        }
    }

    #[test]
    fn focused_task_splits_children() {
        let t = task(false, true, vec![sub(1, true, false), sub(0, false, false)]);
        let open = filtered_not_completed_in_focus_task(&t).expect("open part");
        assert_eq!(open.children, vec![sub(0, false, false)]);
        let done = filtered_completed_in_focus_task(&t).expect("done part");
        assert_eq!(done.children, vec![sub(1, true, false)]);
    }

    #[test]
    fn unfocused_task_only_keeps_focused_children() {
        let t = task(false, false, vec![sub(0, false, true), sub(1, false, false)]);
        let open = filtered_not_completed_in_focus_task(&t).expect("open part");
        assert_eq!(open.children, vec![sub(0, false, true)]);
        assert!(filtered_completed_in_focus_task(&t).is_none());

        let nothing = task(false, false, vec![sub(0, false, false)]);
        assert!(filtered_not_completed_in_focus_task(&nothing).is_none());
        assert!(filtered_completed_in_focus_task(&nothing).is_none());
    }

    #[test]
    fn completed_focused_task_is_only_in_completed_list() {
        let t = task(true, true, vec![sub(0, false, false)]);
        assert!(filtered_not_completed_in_focus_task(&t).is_none());
        let done = filtered_completed_in_focus_task(&t).expect("done part");
        assert_eq!(done.children.len(), 1);
    }

    #[test]
    fn progress_counts_focus_items() {
        let focused = task(false, true, vec![sub(0, true, false), sub(1, false, false)]);
        let partial = task(false, false, vec![sub(0, true, true), sub(1, false, false)]);
        let done = task(true, true, vec![sub(0, false, false)]);
        let progress = compute_task_progress([&focused, &partial, &done]);
        assert_eq!(
            progress,
            TasksProgress {
                completed_tasks_count: 1 + 1 + 2,
                all_tasks_count: 3 + 1 + 2,
            }
        );
    }
}
