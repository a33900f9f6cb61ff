//! Read-only views derived from a [`State`] for list and calendar screens.

use std::sync::LazyLock;

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::{NONE_TAG_ID, State, Tag, Task};
use crate::options::EngineOptions;
use crate::recurrence::task_occurs_on;
use crate::reorder::IdOrder;

static NONE_TAG: LazyLock<Tag> = LazyLock::new(Tag::none);

pub fn ordered_tags(state: &State) -> Vec<&Tag> {
    let mut tags: Vec<&Tag> = state.tags.values().collect();
    tags.sort_by_key(|tag| tag.order);
    tags
}

/// Unknown tag ids resolve to the built-in "None" tag.
pub fn tag_by_id<'a>(state: &'a State, id: &str) -> &'a Tag {
    state
        .tags
        .get(id)
        .or_else(|| state.tags.get(NONE_TAG_ID))
        .unwrap_or(&*NONE_TAG)
}

pub fn task_by_id<'a>(state: &'a State, id: &str) -> Option<&'a Task> {
    state.tasks.get(id)
}

fn id_order(task: &Task) -> IdOrder {
    IdOrder {
        id: task.id.clone(),
        order: task.order.focus,
    }
}

/// Tasks shown on `date`: everything dated that day plus every repeating
/// task with an occurrence on it, sorted by order.
#[tracing::instrument(skip(state, options))]
pub fn id_order_list_by_date(
    state: &State,
    date: NaiveDate,
    options: &EngineOptions,
) -> Result<Vec<IdOrder>> {
    let mut list: Vec<IdOrder> = state
        .date_task_map
        .get(&date)
        .into_iter()
        .flatten()
        .filter_map(|id| state.tasks.get(id))
        .map(id_order)
        .collect();

    for id in &state.repeated_task_set {
        let Some(task) = state.tasks.get(id) else {
            continue;
        };
        let Some(metadata) = task.repeating() else {
            continue;
        };
        if task_occurs_on(date, metadata, options)? {
            list.push(id_order(task));
        }
    }

    list.sort_by_key(|item| item.order);
    Ok(list)
}

pub fn id_order_list_by_group(state: &State, group: &str) -> Vec<IdOrder> {
    let mut list: Vec<IdOrder> = state
        .group_task_map
        .get(group)
        .into_iter()
        .flatten()
        .filter_map(|id| state.tasks.get(id))
        .map(id_order)
        .collect();
    list.sort_by_key(|item| item.order);
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_falls_back_to_none() {
        let state = State::default();
        assert_eq!(tag_by_id(&state, "missing").id, NONE_TAG_ID);

        let mut empty = State::default();
        empty.tags.clear();
        assert_eq!(tag_by_id(&empty, "missing").name, "None");
    }

    #[test]
    fn tags_sorted_by_order() {
        let mut state = State::default();
        for (id, order) in [("b", 5), ("a", 2)] {
            state.tags.insert(
                id.to_string(),
                Tag {
                    id: id.to_string(),
                    order,
                    name: id.to_uppercase(),
                    color: "blue".to_string(),
                    class_id: None,
                },
            );
        }
        let ids: Vec<&str> = ordered_tags(&state).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![NONE_TAG_ID, "a", "b"]);
    }
}
