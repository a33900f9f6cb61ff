//! Stable drag-and-drop reordering of lists keyed by a unique order value.
//!
//! Moving the item at order `S` to order `D` only touches the items between
//! the two. Each of them takes the order value of its neighbour in the
//! original list rather than `order ± 1`, so gaps left by deletions survive.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvariantViolation, Result};
use crate::model::{SubTask, Task};

/// Which ordering dimension of a record a reorder reads and rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderField {
    #[default]
    Focus,
    FutureView,
}

/// A record that can be placed in an ordered list.
pub trait Reorderable: Clone {
    type Key: Ord + Clone + Debug;

    /// Identity of the record within one list.
    fn reorder_key(&self) -> Self::Key;

    fn order_in(&self, field: OrderField) -> i64;

    fn set_order_in(&mut self, field: OrderField, order: i64);
}

/// Mapping from record key to its new order value.
pub type ReorderMap<K> = BTreeMap<K, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdOrder {
    pub id: String,
    pub order: i64,
}

impl Reorderable for IdOrder {
    type Key = String;

    fn reorder_key(&self) -> String {
        self.id.clone()
    }

    fn order_in(&self, _field: OrderField) -> i64 {
        self.order
    }

    fn set_order_in(&mut self, _field: OrderField, order: i64) {
        self.order = order;
    }
}

impl Reorderable for Task {
    type Key = String;

    fn reorder_key(&self) -> String {
        self.id.clone()
    }

    fn order_in(&self, field: OrderField) -> i64 {
        match field {
            OrderField::Focus => self.order.focus,
            OrderField::FutureView => self.order.future_view,
        }
    }

    fn set_order_in(&mut self, field: OrderField, order: i64) {
        match field {
            OrderField::Focus => self.order.focus = order,
            OrderField::FutureView => self.order.future_view = order,
        }
    }
}

// Subtasks have no identity of their own. Their original order is unique
// within a valid list, so it keys the map for the duration of one reorder.
impl Reorderable for SubTask {
    type Key = i64;

    fn reorder_key(&self) -> i64 {
        self.order
    }

    fn order_in(&self, _field: OrderField) -> i64 {
        self.order
    }

    fn set_order_in(&mut self, _field: OrderField, order: i64) {
        self.order = order;
    }
}

#[must_use]
pub fn sort_by_order<T: Reorderable>(list: &[T], field: OrderField) -> Vec<T> {
    let mut sorted = list.to_vec();
    sorted.sort_by_key(|item| item.order_in(field));
    sorted
}

fn check_sorted_unique<T: Reorderable>(list: &[T], field: OrderField) -> Result<()> {
    for (index, pair) in list.windows(2).enumerate() {
        let order = pair[0].order_in(field);
        let next_order = pair[1].order_in(field);
        if order > next_order {
            return Err(InvariantViolation::Unsorted {
                index,
                order,
                next_order,
            }
            .into());
        }
    }
    let mut seen = BTreeSet::new();
    for item in list {
        let order = item.order_in(field);
        if !seen.insert(order) {
            return Err(InvariantViolation::DuplicateOrder { order }.into());
        }
    }
    Ok(())
}

/// Computes the new order of every item that moves when the item at
/// `source` is dropped at `destination`.
///
/// `list` must be sorted ascending by `field` with unique values.
#[tracing::instrument(skip(list), fields(len = list.len()))]
pub fn compute_reorder_map<T: Reorderable>(
    list: &[T],
    source: i64,
    destination: i64,
    field: OrderField,
) -> Result<ReorderMap<T::Key>> {
    let mut map = ReorderMap::new();
    if source == destination {
        return Ok(map);
    }
    check_sorted_unique(list, field)?;
    if !list.iter().any(|item| item.order_in(field) == source) {
        return Err(InvariantViolation::MissingSourceOrder { order: source }.into());
    }

    let orders: Vec<i64> = list.iter().map(|item| item.order_in(field)).collect();
    for (i, item) in list.iter().enumerate() {
        let order = orders[i];
        if order == source {
            map.insert(item.reorder_key(), destination);
        } else if source < destination && order > source && order <= destination {
            if let Some(previous) = i.checked_sub(1).and_then(|p| orders.get(p)) {
                map.insert(item.reorder_key(), *previous);
            }
        } else if source > destination && order >= destination && order < source {
            if let Some(next) = orders.get(i + 1) {
                map.insert(item.reorder_key(), *next);
            }
        }
    }
    debug!(moved = map.len(), "computed reorder map");
    Ok(map)
}

/// Applies `map` to a copy of `list` and re-sorts it by `field`.
#[must_use]
pub fn get_reordered_list<T: Reorderable>(
    list: &[T],
    map: &ReorderMap<T::Key>,
    field: OrderField,
) -> Vec<T> {
    let mut out: Vec<T> = list
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if let Some(order) = map.get(&item.reorder_key()) {
                item.set_order_in(field, *order);
            }
            item
        })
        .collect();
    out.sort_by_key(|item| item.order_in(field));
    out
}

pub fn reorder<T: Reorderable>(
    list: &[T],
    source: i64,
    destination: i64,
    field: OrderField,
) -> Result<Vec<T>> {
    let map = compute_reorder_map(list, source, destination, field)?;
    Ok(get_reordered_list(list, &map, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;

    fn list(orders: &[i64]) -> Vec<IdOrder> {
        orders
            .iter()
            .map(|order| IdOrder {
                id: format!("t{order}"),
                order: *order,
            })
            .collect()
    }

    fn new_order_of(result: &[IdOrder], id: &str) -> i64 {
        result
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.order)
            .expect("id present after reorder")
    }

    // Checks every property a reorder result must satisfy, for one move.
    fn assert_reorder_contract(original: &[IdOrder], source: i64, destination: i64) {
        let result = reorder(original, source, destination, OrderField::Focus).expect("reorder");
        assert_eq!(result.len(), original.len());

        let orders: Vec<i64> = result.iter().map(|item| item.order).collect();
        assert!(orders.windows(2).all(|w| w[0] < w[1]), "orders {orders:?}");

        let (low, high) = (source.min(destination), source.max(destination));
        let mut between = Vec::new();
        for item in original {
            let new_order = new_order_of(&result, &item.id);
            if item.order == source {
                assert_eq!(new_order, destination);
            } else if item.order < low || item.order > high {
                assert_eq!(new_order, item.order);
            } else {
                between.push(new_order);
                if source < destination {
                    assert!(new_order < destination);
                } else {
                    assert!(new_order > destination);
                }
            }
        }
        assert!(between.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn moving_first_to_last() {
        let original = list(&[1, 2, 3]);
        let result = reorder(&original, 1, 3, OrderField::Focus).expect("reorder");
        let ids: Vec<&str> = result.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3", "t1"]);
        assert_eq!(
            result.iter().map(|item| item.order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn same_source_and_destination_is_identity() {
        let original = list(&[1, 4, 9]);
        for order in [1, 4, 9] {
            let map = compute_reorder_map(&original, order, order, OrderField::Focus)
                .expect("map");
            assert!(map.is_empty());
            assert_eq!(
                reorder(&original, order, order, OrderField::Focus).expect("reorder"),
                original
            );
        }
    }

    #[test]
    fn contract_holds_for_dense_lists() {
        for len in 1..6 {
            let orders: Vec<i64> = (1..=len).collect();
            let original = list(&orders);
            for &source in &orders {
                for &destination in &orders {
                    assert_reorder_contract(&original, source, destination);
                }
            }
        }
    }

    #[test]
    fn contract_holds_with_gaps() {
        let orders = [2, 5, 6, 11, 20];
        let original = list(&orders);
        for &source in &orders {
            for &destination in &orders {
                assert_reorder_contract(&original, source, destination);
            }
        }
    }

    #[test]
    fn rejects_bad_input() {
        let unsorted = list(&[1, 3, 2]);
        assert!(matches!(
            reorder(&unsorted, 1, 2, OrderField::Focus),
            Err(PlannerError::InvariantViolation(InvariantViolation::Unsorted { index: 1, .. }))
        ));

        let duplicated = list(&[1, 2, 2, 4]);
        assert_eq!(
            reorder(&duplicated, 1, 4, OrderField::Focus),
            Err(PlannerError::InvariantViolation(
                InvariantViolation::DuplicateOrder { order: 2 }
            ))
        );
    }

    #[test]
    fn rejects_source_not_in_list() {
        let original = list(&[1, 2, 3]);
        assert_eq!(
            reorder(&original, 0, 2, OrderField::Focus),
            Err(PlannerError::InvariantViolation(
                InvariantViolation::MissingSourceOrder { order: 0 }
            ))
        );
        assert_eq!(
            compute_reorder_map(&list(&[2, 5, 6]), 4, 2, OrderField::Focus),
            Err(PlannerError::InvariantViolation(
                InvariantViolation::MissingSourceOrder { order: 4 }
            ))
        );
    }

    #[test]
    fn subtasks_reorder_by_their_own_order() {
        let subtask = |order: i64, name: &str| SubTask {
            order,
            name: name.to_string(),
            complete: false,
            in_focus: false,
        };
        let children = vec![subtask(0, "a"), subtask(1, "b"), subtask(2, "c")];
        let result = reorder(&children, 2, 0, OrderField::Focus).expect("reorder");
        let names: Vec<&str> = result.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn sorts_by_selected_field() {
        let items = vec![
            IdOrder { id: "b".into(), order: 2 },
            IdOrder { id: "a".into(), order: 1 },
        ];
        let sorted = sort_by_order(&items, OrderField::Focus);
        assert_eq!(sorted[0].id, "a");
    }
}
