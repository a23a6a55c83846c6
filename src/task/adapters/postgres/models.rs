//! Diesel row models for task and audit persistence.

use super::schema::{task_audit_log, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: uuid::Uuid,
    pub board_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub position: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub creator_id: uuid::Uuid,
    pub assignee_id: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub id: uuid::Uuid,
    pub board_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub position: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub creator_id: uuid::Uuid,
    pub assignee_id: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of a task's mutable columns.
///
/// `treat_none_as_null` so clearing a nullable field reaches the row.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub position: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<uuid::Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for audit entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_audit_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditRow {
    pub id: uuid::Uuid,
    pub task_id: uuid::Uuid,
    pub actor_id: uuid::Uuid,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_kind: String,
    pub recorded_at: DateTime<Utc>,
}

/// Insert model for audit entries; `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_audit_log)]
pub struct NewAuditRow {
    pub id: uuid::Uuid,
    pub task_id: uuid::Uuid,
    pub actor_id: uuid::Uuid,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_kind: String,
    pub recorded_at: DateTime<Utc>,
}
