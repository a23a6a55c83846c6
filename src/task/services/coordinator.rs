//! Task mutation coordinator.
//!
//! Each mutation runs as one atomic unit over the lanes it touches: the task
//! write, every position shift and every audit entry commit together or not
//! at all.

use super::{
    allocator::{AllocationError, LanePositionAllocator},
    config::TaskValidationConfig,
    recorder::ChangeRecorder,
};
use crate::board::{
    domain::{BoardId, UserId},
    ports::{BoardRepository, BoardRepositoryError},
};
use crate::task::{
    domain::{
        AuditEntry, LaneKey, LanePosition, LaneSet, Task, TaskDomainError, TaskDraft, TaskId,
        TaskPatch, TaskPriority, TaskStatus, TaskTitle,
    },
    ports::{LaneTransaction, TaskStore, TaskStoreError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    board_id: BoardId,
    actor: UserId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    assignee: Option<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields. `actor` becomes the
    /// task's creator.
    #[must_use]
    pub fn new(board_id: BoardId, actor: UserId, title: impl Into<String>) -> Self {
        Self {
            board_id,
            actor,
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
            assignee: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial status lane.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Assigns the task to a board member.
    #[must_use]
    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

/// Request payload for updating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    actor: UserId,
    patch: TaskPatch,
}

impl UpdateTaskRequest {
    /// Creates an update request.
    #[must_use]
    pub const fn new(task_id: TaskId, actor: UserId, patch: TaskPatch) -> Self {
        Self {
            task_id,
            actor,
            patch,
        }
    }
}

/// Request payload for deleting a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTaskRequest {
    task_id: TaskId,
    actor: UserId,
}

impl DeleteTaskRequest {
    /// Creates a delete request.
    #[must_use]
    pub const fn new(task_id: TaskId, actor: UserId) -> Self {
        Self { task_id, actor }
    }
}

/// Request payload for moving a task within its lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderTaskRequest {
    task_id: TaskId,
    actor: UserId,
    target: LanePosition,
}

impl ReorderTaskRequest {
    /// Creates a reorder request targeting `target` in the task's lane.
    #[must_use]
    pub const fn new(task_id: TaskId, actor: UserId, target: LanePosition) -> Self {
        Self {
            task_id,
            actor,
            target,
        }
    }
}

/// Caller-facing classification of a mutation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// The task or board does not exist.
    NotFound,
    /// Lost a race for a lane; the mutation was rolled back.
    Conflict,
    /// The storage layer failed.
    Storage,
}

/// Service-level errors for task mutations and queries.
#[derive(Debug, Clone, Error)]
pub enum TaskMutationError {
    /// Input failed validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// The task does not exist or was deleted.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// A concurrent mutation won the lane; safe to retry.
    #[error("lane conflict: {0}")]
    Conflict(String),

    /// Task storage failed.
    #[error(transparent)]
    Storage(TaskStoreError),

    /// Board lookup failed.
    #[error(transparent)]
    BoardLookup(BoardRepositoryError),
}

impl TaskMutationError {
    /// Returns the caller-facing error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::BoardNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) | Self::BoardLookup(_) => ErrorKind::Storage,
        }
    }

    /// Returns `true` when repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict)
    }
}

impl From<TaskStoreError> for TaskMutationError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::Conflict(reason) => Self::Conflict(reason),
            TaskStoreError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskStoreError::UnknownBoard(board_id) => Self::BoardNotFound(board_id),
            other => Self::Storage(other),
        }
    }
}

impl From<BoardRepositoryError> for TaskMutationError {
    fn from(err: BoardRepositoryError) -> Self {
        match err {
            BoardRepositoryError::NotFound(board_id) => Self::BoardNotFound(board_id),
            other => Self::BoardLookup(other),
        }
    }
}

impl From<AllocationError> for TaskMutationError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::Domain(domain) => Self::Validation(domain),
            AllocationError::Store(store) => store.into(),
        }
    }
}

/// Result type for task mutation service operations.
pub type TaskMutationResult<T> = Result<T, TaskMutationError>;

/// Task mutation orchestration service.
pub struct TaskMutationService<S, B, C>
where
    S: TaskStore,
    B: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    boards: Arc<B>,
    clock: Arc<C>,
    config: TaskValidationConfig,
}

impl<S, B, C> Clone for TaskMutationService<S, B, C>
where
    S: TaskStore,
    B: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            boards: Arc::clone(&self.boards),
            clock: Arc::clone(&self.clock),
            config: self.config,
        }
    }
}

impl<S, B, C> TaskMutationService<S, B, C>
where
    S: TaskStore,
    B: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a service with the default validation limits.
    #[must_use]
    pub fn new(store: Arc<S>, boards: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            store,
            boards,
            clock,
            config: TaskValidationConfig::default(),
        }
    }

    /// Replaces the validation limits.
    #[must_use]
    pub fn with_config(mut self, config: TaskValidationConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates a task at the tail of its lane and records its creation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Validation`] for invalid input or an
    /// assignee outside the board, [`TaskMutationError::BoardNotFound`] for
    /// an unknown board, and [`TaskMutationError::Conflict`] when the lane
    /// could not be locked in time.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskMutationResult<Task> {
        let actor = request.actor;
        let draft = self.validate_draft(request)?;
        self.ensure_board(draft.board_id).await?;
        if let Some(assignee) = draft.assignee {
            self.ensure_member(draft.board_id, assignee).await?;
        }

        let lane = LaneKey::new(draft.board_id, draft.status);
        let clock = Arc::clone(&self.clock);
        let outcome = self
            .store
            .transact(LaneSet::single(lane), move |tx| -> TaskMutationResult<Task> {
                let position = LanePositionAllocator::allocate_on_insert(tx, lane)?;
                let task = Task::new(draft, position, &*clock);
                tx.insert_task(&task)?;
                ChangeRecorder::record_create(tx, &task, actor)?;
                Ok(task)
            })
            .await;

        let task = observe("create", outcome)?;
        tracing::info!(
            task_id = %task.id(),
            lane = %lane,
            position = %task.position(),
            "task created"
        );
        Ok(task)
    }

    /// Applies a patch to a task, moving it to the tail of a new lane when
    /// its status changes.
    ///
    /// A patch that changes no tracked field writes nothing and returns the
    /// stored task unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::TaskNotFound`] when the task does not
    /// exist, [`TaskMutationError::Validation`] for invalid input, and
    /// [`TaskMutationError::Conflict`] when the task changed lane while the
    /// lanes were being locked.
    pub async fn update(&self, request: UpdateTaskRequest) -> TaskMutationResult<Task> {
        let UpdateTaskRequest {
            task_id,
            actor,
            patch,
        } = request;
        self.config.check_patch(&patch)?;
        let current = self.load_existing(task_id).await?;
        if let Some(assignee) = patch.assignee().as_set() {
            self.ensure_member(current.board_id(), *assignee).await?;
        }

        let from = current.lane();
        let to = patch
            .status()
            .map_or(from, |status| LaneKey::new(current.board_id(), status));
        let clock = Arc::clone(&self.clock);
        let outcome = self
            .store
            .transact(LaneSet::pair(from, to), move |tx| -> TaskMutationResult<UpdateOutcome> {
                let old = reload_in_lane(tx, task_id, from)?;
                let mut merged = old.merged_with(&patch, &*clock)?;
                if ChangeRecorder::diff(&old, &merged).is_empty() {
                    return Ok(UpdateOutcome::Unchanged(old));
                }

                let position =
                    LanePositionAllocator::relocate(tx, old.lane(), old.position(), merged.lane())?;
                merged.reposition(position);
                tx.update_task(&merged)?;
                ChangeRecorder::record_update(tx, &old, &merged, actor)?;
                Ok(UpdateOutcome::Applied(merged))
            })
            .await;

        match observe("update", outcome)? {
            UpdateOutcome::Applied(task) => {
                tracing::info!(
                    task_id = %task.id(),
                    lane = %task.lane(),
                    position = %task.position(),
                    "task updated"
                );
                Ok(task)
            }
            UpdateOutcome::Unchanged(task) => {
                tracing::debug!(%task_id, "update changed no tracked field");
                Ok(task)
            }
        }
    }

    /// Deletes a task, closing the gap in its lane, and returns the deleted
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::TaskNotFound`] when the task does not
    /// exist and [`TaskMutationError::Conflict`] when it changed lane while
    /// the lane was being locked.
    pub async fn delete(&self, request: DeleteTaskRequest) -> TaskMutationResult<Task> {
        let DeleteTaskRequest { task_id, actor } = request;
        let lane = self.load_existing(task_id).await?.lane();
        let clock = Arc::clone(&self.clock);
        let outcome = self
            .store
            .transact(LaneSet::single(lane), move |tx| -> TaskMutationResult<Task> {
                let task = reload_in_lane(tx, task_id, lane)?;
                tx.delete_task(task_id)?;
                LanePositionAllocator::close_gap(tx, lane, task.position())?;
                ChangeRecorder::record_delete(tx, &task, actor, clock.utc())?;
                Ok(task)
            })
            .await;

        let task = observe("delete", outcome)?;
        tracing::info!(task_id = %task.id(), lane = %lane, "task deleted");
        Ok(task)
    }

    /// Moves a task to `target` within its lane, shifting the tasks in
    /// between by one slot.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PositionOutOfRange`] (as
    /// [`TaskMutationError::Validation`]) when `target` is outside the lane,
    /// [`TaskMutationError::TaskNotFound`] when the task does not exist, and
    /// [`TaskMutationError::Conflict`] when the task changed lane while the
    /// lane was being locked.
    pub async fn reorder(&self, request: ReorderTaskRequest) -> TaskMutationResult<Task> {
        let ReorderTaskRequest {
            task_id,
            actor,
            target,
        } = request;
        let lane = self.load_existing(task_id).await?.lane();
        let outcome = self
            .store
            .transact(LaneSet::single(lane), move |tx| -> TaskMutationResult<Task> {
                let mut task = reload_in_lane(tx, task_id, lane)?;
                let position =
                    LanePositionAllocator::reorder(tx, task_id, lane, task.position(), target)?;
                if position != task.position() {
                    task.reposition(position);
                    tx.update_task(&task)?;
                }
                Ok(task)
            })
            .await;

        let task = observe("reorder", outcome)?;
        tracing::info!(
            task_id = %task.id(),
            %actor,
            lane = %lane,
            position = %task.position(),
            "task reordered"
        );
        Ok(task)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskMutationResult<Option<Task>> {
        Ok(self.store.find_by_id(task_id).await?)
    }

    /// Returns the committed tasks of a lane ordered by position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] when the scan fails.
    pub async fn lane_contents(
        &self,
        board_id: BoardId,
        status: TaskStatus,
    ) -> TaskMutationResult<Vec<Task>> {
        Ok(self.store.lane(LaneKey::new(board_id, status)).await?)
    }

    /// Returns the audit history of a task in commit order. Entries survive
    /// the task's deletion.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] when the scan fails.
    pub async fn audit_history(&self, task_id: TaskId) -> TaskMutationResult<Vec<AuditEntry>> {
        Ok(self.store.audit_history(task_id).await?)
    }

    fn validate_draft(&self, request: CreateTaskRequest) -> TaskMutationResult<TaskDraft> {
        let title = TaskTitle::new(request.title)?;
        self.config.check_title(&title)?;
        self.config.check_description(request.description.as_deref())?;
        Ok(TaskDraft {
            board_id: request.board_id,
            creator: request.actor,
            title,
            description: request.description,
            status: request.status,
            priority: request.priority,
            due_date: request.due_date,
            assignee: request.assignee,
        })
    }

    async fn ensure_board(&self, board_id: BoardId) -> TaskMutationResult<()> {
        if self.boards.exists(board_id).await? {
            Ok(())
        } else {
            Err(TaskMutationError::BoardNotFound(board_id))
        }
    }

    async fn ensure_member(&self, board_id: BoardId, assignee: UserId) -> TaskMutationResult<()> {
        if self.boards.is_member(board_id, assignee).await? {
            Ok(())
        } else {
            Err(TaskDomainError::AssigneeNotMember { board_id, assignee }.into())
        }
    }

    async fn load_existing(&self, task_id: TaskId) -> TaskMutationResult<Task> {
        self.store
            .find_by_id(task_id)
            .await?
            .ok_or(TaskMutationError::TaskNotFound(task_id))
    }
}

/// Result of an update's atomic unit.
enum UpdateOutcome {
    Applied(Task),
    /// The patch matched the locked snapshot, which is returned as stored.
    Unchanged(Task),
}

/// Re-reads a task under lock, failing when it left `expected` meanwhile.
fn reload_in_lane(
    tx: &mut dyn LaneTransaction,
    task_id: TaskId,
    expected: LaneKey,
) -> TaskMutationResult<Task> {
    let task = tx
        .load_task(task_id)?
        .ok_or(TaskMutationError::TaskNotFound(task_id))?;
    if task.lane() != expected {
        return Err(TaskMutationError::Conflict(format!(
            "task {task_id} moved from lane {expected} to {} before the lane was locked",
            task.lane()
        )));
    }
    Ok(task)
}

fn observe<T>(operation: &'static str, outcome: TaskMutationResult<T>) -> TaskMutationResult<T> {
    if let Err(err) = &outcome {
        match err.kind() {
            ErrorKind::Conflict | ErrorKind::Storage => {
                tracing::warn!(operation, error = %err, "task mutation rolled back");
            }
            ErrorKind::Validation | ErrorKind::NotFound => {
                tracing::debug!(operation, error = %err, "task mutation rejected");
            }
        }
    }
    outcome
}
