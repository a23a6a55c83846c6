//! Partial updates to a task's caller-editable fields.

use super::{TaskPriority, TaskStatus};
use crate::board::domain::UserId;
use chrono::{DateTime, Utc};

/// Update instruction for a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the current value untouched.
    #[default]
    Keep,
    /// Reset the field to `null`.
    Clear,
    /// Replace the current value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Resolves the update against the current value.
    #[must_use]
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }

    /// Returns `true` when the update leaves the field untouched.
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Returns the replacement value, if any.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

/// Requested changes to a task.
///
/// Fields left unset keep their current value. Position is not part of a
/// patch: it follows from status changes and explicit reorders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    title: Option<String>,
    description: FieldUpdate<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    due_date: FieldUpdate<DateTime<Utc>>,
    assignee: FieldUpdate<UserId>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = FieldUpdate::Set(description.into());
        self
    }

    /// Clears the description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = FieldUpdate::Clear;
        self
    }

    /// Moves the task to another status lane.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Changes the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = FieldUpdate::Set(due_date);
        self
    }

    /// Clears the due date.
    #[must_use]
    pub fn clear_due_date(mut self) -> Self {
        self.due_date = FieldUpdate::Clear;
        self
    }

    /// Assigns the task.
    #[must_use]
    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = FieldUpdate::Set(assignee);
        self
    }

    /// Removes the assignee.
    #[must_use]
    pub fn clear_assignee(mut self) -> Self {
        self.assignee = FieldUpdate::Clear;
        self
    }

    /// Returns the requested title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description update.
    #[must_use]
    pub const fn description(&self) -> &FieldUpdate<String> {
        &self.description
    }

    /// Returns the requested status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the requested priority, if any.
    #[must_use]
    pub const fn priority(&self) -> Option<TaskPriority> {
        self.priority
    }

    /// Returns the due date update.
    #[must_use]
    pub const fn due_date(&self) -> &FieldUpdate<DateTime<Utc>> {
        &self.due_date
    }

    /// Returns the assignee update.
    #[must_use]
    pub const fn assignee(&self) -> &FieldUpdate<UserId> {
        &self.assignee
    }

    /// Returns `true` when the patch requests no change at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_keep()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_keep()
            && self.assignee.is_keep()
    }
}
