//! Field-level audit trail entries.

use super::{AuditEntryId, ParseAuditFieldError, ParseChangeKindError, TaskId};
use crate::board::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the task attribute an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditField {
    /// The task as a whole; used for creation and deletion.
    Task,
    /// The title.
    Title,
    /// The description.
    Description,
    /// The workflow status.
    Status,
    /// The priority.
    Priority,
    /// The due date.
    DueDate,
    /// The assignee.
    Assignee,
}

impl AuditField {
    /// Fields compared when recording an update, in emission order.
    pub const TRACKED: [Self; 6] = [
        Self::Title,
        Self::Description,
        Self::Status,
        Self::Priority,
        Self::DueDate,
        Self::Assignee,
    ];

    /// Returns the persisted field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Title => "title",
            Self::Description => "description",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::DueDate => "due_date",
            Self::Assignee => "assignee",
        }
    }
}

impl TryFrom<&str> for AuditField {
    type Error = ParseAuditFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "task" => Ok(Self::Task),
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            "due_date" => Ok(Self::DueDate),
            "assignee" => Ok(Self::Assignee),
            _ => Err(ParseAuditFieldError(value.to_owned())),
        }
    }
}

impl fmt::Display for AuditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mutation that produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// The task was created.
    Create,
    /// A tracked field changed.
    Update,
    /// The task was deleted.
    Delete,
}

impl ChangeKind {
    /// Returns the canonical textual representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl TryFrom<&str> for ChangeKind {
    type Error = ParseChangeKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ParseChangeKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed field between two task snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// The field that differs.
    pub field: AuditField,
    /// Value before the change, in canonical text.
    pub old_value: Option<String>,
    /// Value after the change, in canonical text.
    pub new_value: Option<String>,
}

/// Immutable record of a field-level change to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    task_id: TaskId,
    actor: UserId,
    field: AuditField,
    old_value: Option<String>,
    new_value: Option<String>,
    kind: ChangeKind,
    recorded_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAuditEntry {
    /// Persisted entry identifier.
    pub id: AuditEntryId,
    /// Task the entry describes.
    pub task_id: TaskId,
    /// User who performed the mutation.
    pub actor: UserId,
    /// Field the entry describes.
    pub field: AuditField,
    /// Prior value.
    pub old_value: Option<String>,
    /// New value.
    pub new_value: Option<String>,
    /// Mutation kind.
    pub kind: ChangeKind,
    /// Timestamp of the mutation.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Records a change made by `actor` at `recorded_at`.
    #[must_use]
    pub fn record(
        task_id: TaskId,
        actor: UserId,
        change: FieldChange,
        kind: ChangeKind,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            task_id,
            actor,
            field: change.field,
            old_value: change.old_value,
            new_value: change.new_value,
            kind,
            recorded_at,
        }
    }

    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAuditEntry) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            actor: data.actor,
            field: data.field,
            old_value: data.old_value,
            new_value: data.new_value,
            kind: data.kind,
            recorded_at: data.recorded_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> AuditEntryId {
        self.id
    }

    /// Returns the task the entry describes.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> UserId {
        self.actor
    }

    /// Returns the changed field.
    #[must_use]
    pub const fn field(&self) -> AuditField {
        self.field
    }

    /// Returns the prior value.
    #[must_use]
    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    /// Returns the new value.
    #[must_use]
    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    /// Returns the mutation kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns the mutation timestamp.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
