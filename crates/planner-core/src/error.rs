use std::fmt;

use crate::model::TaskId;

/// Errors raised by the planner engine.
///
/// Every variant is fatal for the call that produced it. Nothing is mutated
/// in place, so a failed call simply yields no new value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    #[error("unsupported recurrence pattern: {kind}")]
    UnsupportedRecurrence { kind: &'static str },

    #[error("occurrence scan exceeded {limit_days} days")]
    ScanLimitExceeded { limit_days: u32 },

    #[error("invalid {kind} mask {mask:#b}: wider than {width} bits")]
    InvalidPatternMask {
        kind: &'static str,
        mask: u32,
        width: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("list not sorted: order {order} at index {index} precedes {next_order}")]
    Unsorted {
        index: usize,
        order: i64,
        next_order: i64,
    },

    #[error("order {order} appears more than once")]
    DuplicateOrder { order: i64 },

    #[error("no item has order {order}")]
    MissingSourceOrder { order: i64 },

    #[error("{op} references task {id} which is not in the store")]
    MissingTask { id: TaskId, op: TaskOp },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOp {
    Edit,
    Delete,
}

impl fmt::Display for TaskOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOp::Edit => f.write_str("edit"),
            TaskOp::Delete => f.write_str("delete"),
        }
    }
}

pub type Result<T, E = PlannerError> = std::result::Result<T, E>;
