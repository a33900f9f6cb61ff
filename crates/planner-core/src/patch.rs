use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    BannerMessageStatus, Course, Group, PendingGroupInvite, Settings, Tag, Task, TaskId,
};
use crate::reorder::{OrderField, compute_reorder_map, get_reordered_list};

/// Created, edited and deleted records of one entity kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityPatch<T> {
    #[serde(default = "Vec::new")]
    pub created: Vec<T>,
    #[serde(default = "Vec::new")]
    pub edited: Vec<T>,
    #[serde(default)]
    pub deleted: Vec<String>,
}

impl<T> Default for EntityPatch<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            edited: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T> EntityPatch<T> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.edited.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchSettings {
    pub settings: Settings,
}

/// Partial status, merged key by key into the current one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchBannerMessageStatus {
    pub change: BannerMessageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchCourses {
    pub courses: BTreeMap<String, Vec<Course>>,
}

/// One atomic state transition, as delivered by the sync layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Patch {
    #[serde(rename = "PATCH_TAGS")]
    Tags(EntityPatch<Tag>),
    #[serde(rename = "PATCH_TASKS")]
    Tasks(EntityPatch<Task>),
    #[serde(rename = "PATCH_SETTINGS")]
    Settings(PatchSettings),
    #[serde(rename = "PATCH_BANNER_MESSAGES")]
    BannerMessageStatus(PatchBannerMessageStatus),
    #[serde(rename = "PATCH_COURSES")]
    Courses(PatchCourses),
    #[serde(rename = "PATCH_GROUPS")]
    Groups(EntityPatch<Group>),
    #[serde(rename = "PATCH_GROUP_INVITES", alias = "PATCH_PENDING_GROUP_INVITE")]
    GroupInvites(EntityPatch<PendingGroupInvite>),
    /// Any patch type this engine does not know. Applying it is a no-op.
    #[serde(other)]
    Unsupported,
}

impl Patch {
    pub fn kind(&self) -> &'static str {
        match self {
            Patch::Tags(_) => "PATCH_TAGS",
            Patch::Tasks(_) => "PATCH_TASKS",
            Patch::Settings(_) => "PATCH_SETTINGS",
            Patch::BannerMessageStatus(_) => "PATCH_BANNER_MESSAGES",
            Patch::Courses(_) => "PATCH_COURSES",
            Patch::Groups(_) => "PATCH_GROUPS",
            Patch::GroupInvites(_) => "PATCH_GROUP_INVITES",
            Patch::Unsupported => "UNSUPPORTED",
        }
    }

    pub fn edit_tasks(edited: Vec<Task>) -> Self {
        Patch::Tasks(EntityPatch {
            edited,
            ..EntityPatch::default()
        })
    }
}

/// Records addressable by a string id inside a patch.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Tag {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Task {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Group {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for PendingGroupInvite {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Builds the patch that commits dragging the task at `source` to
/// `destination` within `list`. Only tasks whose order changed are edited.
pub fn task_reorder_patch(
    list: &[Task],
    source: i64,
    destination: i64,
    field: OrderField,
) -> Result<Patch> {
    let map = compute_reorder_map(list, source, destination, field)?;
    let edited: Vec<Task> = get_reordered_list(list, &map, field)
        .into_iter()
        .filter(|task| map.contains_key(&task.id))
        .collect();
    Ok(Patch::edit_tasks(edited))
}

/// Builds the patch that commits moving one subtask of `task`.
pub fn subtask_reorder_patch(task: &Task, source: i64, destination: i64) -> Result<Patch> {
    let children = crate::reorder::reorder(&task.children, source, destination, OrderField::Focus)?;
    let edited = Task {
        children,
        ..task.clone()
    };
    Ok(Patch::edit_tasks(vec![edited]))
}

/// Ids of every task a patch touches, in created, edited, deleted order.
pub fn touched_task_ids(patch: &EntityPatch<Task>) -> Vec<TaskId> {
    patch
        .created
        .iter()
        .chain(patch.edited.iter())
        .map(|task| task.id.clone())
        .chain(patch.deleted.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_tagged_patches() {
        let patch: Patch = serde_json::from_value(json!({
            "type": "PATCH_TAGS",
            "created": [{ "id": "cs", "order": 1, "name": "CS 3110", "color": "red", "classId": "3110" }],
            "deleted": ["old"]
        }))
        .expect("tag patch");
        let Patch::Tags(tags) = patch else {
            panic!("expected a tag patch");
        };
        assert_eq!(tags.created.len(), 1);
        assert!(tags.edited.is_empty());
        assert_eq!(tags.deleted, vec!["old".to_string()]);
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let patch: Patch = serde_json::from_value(json!({ "type": "PATCH_SUBTASKS" }))
            .expect("unknown kinds still parse");
        assert_eq!(patch, Patch::Unsupported);
        assert_eq!(patch.kind(), "UNSUPPORTED");
    }

    #[test]
    fn pending_invite_kind_is_accepted() {
        let patch: Patch = serde_json::from_value(json!({
            "type": "PATCH_PENDING_GROUP_INVITE",
            "created": [{ "id": "inv1", "group": "capstone", "inviterName": "Alex" }]
        }))
        .expect("invite patch");
        let Patch::GroupInvites(invites) = patch else {
            panic!("expected an invite patch");
        };
        assert_eq!(invites.created[0].inviter_name, "Alex");
    }

    #[test]
    fn banner_change_is_partial() {
        let patch: Patch = serde_json::from_value(json!({
            "type": "PATCH_BANNER_MESSAGES",
            "change": { "2019-03-10-quota-exceeded-incident": true }
        }))
        .expect("banner patch");
        assert_eq!(patch.kind(), "PATCH_BANNER_MESSAGES");
    }
}
