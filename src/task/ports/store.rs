//! Transactional storage port for tasks, lanes and the audit log.

use crate::board::domain::{BoardId, UserId};
use crate::task::domain::{
    AuditEntry, LaneKey, LanePosition, LaneSet, LaneSpan, ShiftDirection, Task, TaskId,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task storage contract.
///
/// Reads observe committed state only. Every write goes through
/// [`TaskStore::transact`], which holds the requested lanes exclusively for
/// the duration of the unit of work and commits all of its writes together.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Returns the tasks of a lane ordered by position.
    async fn lane(&self, lane: LaneKey) -> TaskStoreResult<Vec<Task>>;

    /// Returns every task on a board, ordered by status then position.
    async fn board_tasks(&self, board_id: BoardId) -> TaskStoreResult<Vec<Task>>;

    /// Returns every task assigned to a user.
    async fn tasks_assigned_to(&self, user_id: UserId) -> TaskStoreResult<Vec<Task>>;

    /// Returns the audit entries of a task in commit order.
    async fn audit_history(&self, task_id: TaskId) -> TaskStoreResult<Vec<AuditEntry>>;

    /// Runs `work` as one atomic unit over `lanes`.
    ///
    /// Lanes are locked in ascending order before `work` runs. When `work`
    /// returns `Err` nothing it wrote is kept.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`TaskStoreError`]
    /// converted into `E` when locking or committing fails.
    async fn transact<T, E, F>(&self, lanes: LaneSet, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<TaskStoreError> + Send + 'static,
        F: FnOnce(&mut dyn LaneTransaction) -> Result<T, E> + Send + 'static;
}

/// Unit of work over a set of exclusively held lanes.
///
/// Reads see the writes already issued through the same transaction.
pub trait LaneTransaction: Send {
    /// Loads a task, including writes staged in this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the lookup fails.
    fn load_task(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Returns the number of tasks currently in a locked lane.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::LaneNotLocked`] for a lane outside the set.
    fn lane_len(&mut self, lane: LaneKey) -> TaskStoreResult<usize>;

    /// Returns the tasks of a locked lane ordered by position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::LaneNotLocked`] for a lane outside the set.
    fn lane_tasks(&mut self, lane: LaneKey) -> TaskStoreResult<Vec<Task>>;

    /// Inserts a new task into its (locked) lane.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the identifier exists
    /// and [`TaskStoreError::UnknownBoard`] when the board does not.
    fn insert_task(&mut self, task: &Task) -> TaskStoreResult<()>;

    /// Replaces a stored task.
    ///
    /// Both the stored and the new lane must be locked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    fn update_task(&mut self, task: &Task) -> TaskStoreResult<()>;

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    fn delete_task(&mut self, id: TaskId) -> TaskStoreResult<()>;

    /// Moves every task whose position falls in `span` one slot in
    /// `direction`, returning how many tasks moved.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::LaneNotLocked`] for a lane outside the set.
    fn shift_lane(
        &mut self,
        lane: LaneKey,
        span: LaneSpan,
        direction: ShiftDirection,
    ) -> TaskStoreResult<usize>;

    /// Appends audit entries, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when staging fails.
    fn append_audit(&mut self, entries: &[AuditEntry]) -> TaskStoreResult<()>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The referenced board does not exist.
    #[error("board not found: {0}")]
    UnknownBoard(BoardId),

    /// The unit of work touched a lane it does not hold.
    #[error("lane {0} is not locked by this transaction")]
    LaneNotLocked(LaneKey),

    /// The unit of work lost a race for a lane and was rolled back.
    #[error("lane conflict: {0}")]
    Conflict(String),

    /// A shifted position no longer fits the lane.
    #[error("position {position} cannot move within lane {lane}")]
    PositionOverflow {
        /// The affected lane.
        lane: LaneKey,
        /// The position that could not move.
        position: LanePosition,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a conflict error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }
}

/// Settings applied to every atomic unit a store runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransactionSettings {
    /// Maximum time to wait for the lane locks, in milliseconds.
    pub lock_timeout_ms: u64,
}

impl TransactionSettings {
    /// Default lane lock wait.
    pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

    /// Creates settings with the given lock wait in milliseconds.
    #[must_use]
    pub const fn with_lock_timeout_ms(lock_timeout_ms: u64) -> Self {
        Self { lock_timeout_ms }
    }

    /// Returns the lock wait as a [`Duration`].
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            lock_timeout_ms: Self::DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}
