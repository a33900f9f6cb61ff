//! Planner engine: list reordering, recurrence matching and the normalized
//! task store. Everything here is pure and performs no I/O.

pub mod bitset;
pub mod error;
pub mod focus;
pub mod model;
pub mod options;
pub mod patch;
pub mod recurrence;
pub mod reorder;
pub mod selectors;
pub mod store;

pub use error::{InvariantViolation, PlannerError, TaskOp};
pub use model::State;
pub use options::{EngineOptions, MissingTaskPolicy};
pub use patch::Patch;
pub use store::Planner;
