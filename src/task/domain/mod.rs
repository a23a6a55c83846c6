//! Domain model for board tasks, lanes and the audit trail.
//!
//! Tasks live in lanes keyed by `(board, status)` and carry a dense
//! position within their lane. Audit entries are immutable field-level
//! records produced alongside every committed mutation. Infrastructure
//! concerns stay outside this boundary.

mod audit;
mod error;
mod ids;
mod lane;
mod patch;
mod statistics;
mod status;
mod task;

pub use audit::{AuditEntry, AuditField, ChangeKind, FieldChange, PersistedAuditEntry};
pub use error::{
    ParseAuditFieldError, ParseChangeKindError, ParseTaskPriorityError, ParseTaskStatusError,
    TaskDomainError,
};
pub use ids::{AuditEntryId, LanePosition, TaskId};
pub use lane::{LaneKey, LaneSet, LaneSpan, ShiftDirection, lane_is_dense};
pub use patch::{FieldUpdate, TaskPatch};
pub use statistics::{BoardStatistics, StatusCounts, UserStatistics};
pub use status::{TaskPriority, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskDraft, TaskTitle};
