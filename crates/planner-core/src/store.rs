//! The normalized task store: a pure reducer from `(State, Patch)` to the
//! next `State`.
//!
//! Each call clones the maps it rewrites and returns the copy, so a state
//! handed out earlier is never observed changing. A patch is applied
//! against one working copy and either fully succeeds or yields an error
//! and no state at all.

use std::borrow::Cow;
use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::error::{InvariantViolation, PlannerError, Result, TaskOp};
use crate::model::{State, Task, TaskId, TaskIdSet, TaskMetadata};
use crate::options::{EngineOptions, MissingTaskPolicy};
use crate::patch::{EntityPatch, Keyed, Patch, touched_task_ids};

#[derive(Debug, Clone, Copy, Default)]
pub struct Planner {
    options: EngineOptions,
}

impl Planner {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Applies one patch. An unsupported patch kind hands back the input
    /// state itself.
    #[tracing::instrument(skip_all, fields(kind = patch.kind()))]
    pub fn apply<'a>(&self, state: &'a State, patch: &Patch) -> Result<Cow<'a, State>> {
        let next = match patch {
            Patch::Tags(p) => {
                let mut next = state.clone();
                apply_entity_patch(&mut next.tags, p);
                next
            }
            Patch::Tasks(p) => self.patch_tasks(state, p)?,
            Patch::Settings(p) => State {
                settings: p.settings.clone(),
                ..state.clone()
            },
            Patch::BannerMessageStatus(p) => {
                let mut next = state.clone();
                next.banner_message_status
                    .extend(p.change.iter().map(|(k, v)| (k.clone(), *v)));
                next
            }
            Patch::Courses(p) => State {
                courses: p.courses.clone(),
                ..state.clone()
            },
            Patch::Groups(p) => {
                let mut next = state.clone();
                apply_entity_patch(&mut next.groups, p);
                next
            }
            Patch::GroupInvites(p) => {
                let mut next = state.clone();
                apply_entity_patch(&mut next.group_invites, p);
                next
            }
            Patch::Unsupported => {
                debug!("ignoring unsupported patch");
                return Ok(Cow::Borrowed(state));
            }
        };
        Ok(Cow::Owned(next))
    }

    /// Applies patches in order, stopping at the first failure.
    pub fn apply_all<'p, I>(&self, state: &State, patches: I) -> Result<State>
    where
        I: IntoIterator<Item = &'p Patch>,
    {
        let mut current = state.clone();
        for patch in patches {
            current = self.apply(&current, patch)?.into_owned();
        }
        Ok(current)
    }

    fn patch_tasks(&self, state: &State, patch: &EntityPatch<Task>) -> Result<State> {
        trace!(ids = ?touched_task_ids(patch), "patching tasks");
        let mut next = state.clone();

        for task in &patch.created {
            if let Some(old) = next.tasks.remove(&task.id) {
                debug!(id = %task.id, "create replaces an existing task");
                self.unindex(&mut next, &old);
            }
            self.insert(&mut next, task);
        }

        for task in &patch.edited {
            match next.tasks.remove(&task.id) {
                Some(old) => self.unindex(&mut next, &old),
                None => {
                    self.missing_task(&task.id, TaskOp::Edit)?;
                    continue;
                }
            }
            self.insert(&mut next, task);
        }

        for id in &patch.deleted {
            match next.tasks.remove(id) {
                Some(old) => self.unindex(&mut next, &old),
                None => self.missing_task(id, TaskOp::Delete)?,
            }
        }

        debug!(
            created = patch.created.len(),
            edited = patch.edited.len(),
            deleted = patch.deleted.len(),
            tasks = next.tasks.len(),
            "patched tasks"
        );
        Ok(next)
    }

    fn missing_task(&self, id: &TaskId, op: TaskOp) -> Result<()> {
        match self.options.missing_task {
            MissingTaskPolicy::Fail => Err(PlannerError::InvariantViolation(
                InvariantViolation::MissingTask { id: id.clone(), op },
            )),
            MissingTaskPolicy::Skip => {
                warn!(%id, %op, "skipping patch item for unknown task");
                Ok(())
            }
        }
    }

    fn insert(&self, next: &mut State, task: &Task) {
        let mut task = task.clone();
        task.children.sort_by_key(|child| child.order);
        self.index(next, &task);
        next.tasks.insert(task.id.clone(), task);
    }

    fn index(&self, next: &mut State, task: &Task) {
        let id = &task.id;
        match &task.metadata {
            TaskMetadata::OneTime { date, .. } => {
                add_to_bucket(&mut next.date_task_map, self.options.day_of(*date), id);
            }
            TaskMetadata::Repeating(_) => {
                next.repeated_task_set.insert(id.clone());
            }
            TaskMetadata::Group { date, group } => {
                add_to_bucket(&mut next.date_task_map, self.options.day_of(*date), id);
                add_to_bucket(&mut next.group_task_map, group.clone(), id);
                next.group_task_set.insert(id.clone());
            }
        }
    }

    fn unindex(&self, next: &mut State, task: &Task) {
        let id = &task.id;
        match &task.metadata {
            TaskMetadata::OneTime { date, .. } => {
                remove_from_bucket(&mut next.date_task_map, &self.options.day_of(*date), id);
            }
            TaskMetadata::Repeating(_) => {
                next.repeated_task_set.remove(id);
            }
            TaskMetadata::Group { date, group } => {
                remove_from_bucket(&mut next.date_task_map, &self.options.day_of(*date), id);
                remove_from_bucket(&mut next.group_task_map, group, id);
                next.group_task_set.remove(id);
            }
        }
    }
}

/// Applies a patch with the default engine options.
pub fn apply<'a>(state: &'a State, patch: &Patch) -> Result<Cow<'a, State>> {
    Planner::default().apply(state, patch)
}

fn apply_entity_patch<T: Keyed + Clone>(map: &mut BTreeMap<String, T>, patch: &EntityPatch<T>) {
    for item in patch.created.iter().chain(patch.edited.iter()) {
        map.insert(item.key().to_string(), item.clone());
    }
    for id in &patch.deleted {
        map.remove(id);
    }
}

fn add_to_bucket<K: Ord + std::fmt::Debug>(
    buckets: &mut BTreeMap<K, TaskIdSet>,
    key: K,
    id: &TaskId,
) {
    trace!(?key, %id, "index add");
    buckets.entry(key).or_default().insert(id.clone());
}

// Empty buckets are dropped so that equal task maps give equal indices.
fn remove_from_bucket<K, Q>(buckets: &mut BTreeMap<K, TaskIdSet>, key: &Q, id: &TaskId)
where
    K: Ord + std::borrow::Borrow<Q>,
    Q: Ord + std::fmt::Debug + ?Sized,
{
    trace!(?key, %id, "index remove");
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.remove(id);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}
