//! Error types for task domain validation and parsing.

use super::{LanePosition, TaskId};
use crate::board::domain::{BoardId, UserId};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
///
/// Every variant describes caller input that cannot succeed without being
/// changed, so none of them are retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the configured limit.
    #[error("task title has {actual} characters, exceeds limit of {max}")]
    TitleTooLong {
        /// The configured maximum.
        max: usize,
        /// The submitted length.
        actual: usize,
    },

    /// The task description exceeds the configured limit.
    #[error("task description has {actual} characters, exceeds limit of {max}")]
    DescriptionTooLong {
        /// The configured maximum.
        max: usize,
        /// The submitted length.
        actual: usize,
    },

    /// A manual reorder targeted a slot outside the lane.
    #[error("position {requested} is outside lane of size {lane_size} for task {task_id}")]
    PositionOutOfRange {
        /// The task being reordered.
        task_id: TaskId,
        /// The requested target position.
        requested: LanePosition,
        /// The number of tasks in the lane.
        lane_size: usize,
    },

    /// The requested assignee does not belong to the task's board.
    #[error("user {assignee} is not a member of board {board_id}")]
    AssigneeNotMember {
        /// The board the task belongs to.
        board_id: BoardId,
        /// The rejected assignee.
        assignee: UserId,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);

/// Error returned while parsing audit field names from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown audit field: {0}")]
pub struct ParseAuditFieldError(pub String);

/// Error returned while parsing audit change kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown change kind: {0}")]
pub struct ParseChangeKindError(pub String);
