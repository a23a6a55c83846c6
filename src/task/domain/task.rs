//! Task aggregate root.

use super::{LaneKey, LanePosition, TaskDomainError, TaskId, TaskPatch, TaskPriority, TaskStatus};
use crate::board::domain::{BoardId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated, trimmed task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated content of a task that has not been placed in a lane yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Board the task will belong to.
    pub board_id: BoardId,
    /// Creating user; immutable afterwards.
    pub creator: UserId,
    /// Task title.
    pub title: TaskTitle,
    /// Optional description.
    pub description: Option<String>,
    /// Initial status lane.
    pub status: TaskStatus,
    /// Initial priority.
    pub priority: TaskPriority,
    /// Optional due timestamp.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional assignee.
    pub assignee: Option<UserId>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    board_id: BoardId,
    title: TaskTitle,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    position: LanePosition,
    due_date: Option<DateTime<Utc>>,
    creator: UserId,
    assignee: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted board reference.
    pub board_id: BoardId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted lane position.
    pub position: LanePosition,
    /// Persisted due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted creator.
    pub creator: UserId,
    /// Persisted assignee, if any.
    pub assignee: Option<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task from a draft at the given lane position.
    #[must_use]
    pub fn new(draft: TaskDraft, position: LanePosition, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            board_id: draft.board_id,
            title: draft.title,
            description: normalize_description(draft.description),
            status: draft.status,
            priority: draft.priority,
            position,
            due_date: draft.due_date,
            creator: draft.creator,
            assignee: draft.assignee,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            position: data.position,
            due_date: data.due_date,
            creator: data.creator,
            assignee: data.assignee,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the position within the lane.
    #[must_use]
    pub const fn position(&self) -> LanePosition {
        self.position
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn creator(&self) -> UserId {
        self.creator
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the lane the task currently occupies.
    #[must_use]
    pub const fn lane(&self) -> LaneKey {
        LaneKey::new(self.board_id, self.status)
    }

    /// Returns `true` when the task is past due and not finished.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < now)
    }

    /// Returns the snapshot that results from applying `patch`.
    ///
    /// The position is carried over unchanged; a status change leaves the
    /// returned task addressing its old slot until the caller relocates it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the patch blanks the
    /// title.
    pub fn merged_with(
        &self,
        patch: &TaskPatch,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = match patch.title() {
            Some(raw) => TaskTitle::new(raw)?,
            None => self.title.clone(),
        };
        let description =
            normalize_description(patch.description().clone().apply(self.description.clone()));

        Ok(Self {
            title,
            description,
            status: patch.status().unwrap_or(self.status),
            priority: patch.priority().unwrap_or(self.priority),
            due_date: patch.due_date().clone().apply(self.due_date),
            assignee: patch.assignee().clone().apply(self.assignee),
            updated_at: clock.utc(),
            ..self.clone()
        })
    }

    /// Moves the task to another slot, keeping its status.
    pub(crate) const fn reposition(&mut self, position: LanePosition) {
        self.position = position;
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|text| !text.trim().is_empty())
}
