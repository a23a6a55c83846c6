//! Field-level change recording.

use crate::board::domain::UserId;
use crate::task::{
    domain::{AuditEntry, AuditField, ChangeKind, FieldChange, Task},
    ports::{LaneTransaction, TaskStoreResult},
};
use chrono::{DateTime, SecondsFormat, Utc};

/// Derives audit entries from task snapshots and stages them in the
/// surrounding transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeRecorder;

impl ChangeRecorder {
    /// Returns one change per tracked field whose canonical text differs.
    ///
    /// Position and timestamps are never reported.
    #[must_use]
    pub fn diff(old: &Task, new: &Task) -> Vec<FieldChange> {
        AuditField::TRACKED
            .into_iter()
            .filter_map(|field| {
                let old_value = field_value(old, field);
                let new_value = field_value(new, field);
                (old_value != new_value).then_some(FieldChange {
                    field,
                    old_value,
                    new_value,
                })
            })
            .collect()
    }

    /// Stages the creation entry for `task`.
    ///
    /// # Errors
    ///
    /// Returns the store error when staging fails.
    pub fn record_create(
        tx: &mut dyn LaneTransaction,
        task: &Task,
        actor: UserId,
    ) -> TaskStoreResult<Vec<AuditEntry>> {
        let entry = AuditEntry::record(
            task.id(),
            actor,
            FieldChange {
                field: AuditField::Task,
                old_value: None,
                new_value: Some(task.title().as_str().to_owned()),
            },
            ChangeKind::Create,
            task.created_at(),
        );
        Self::append(tx, vec![entry])
    }

    /// Stages one entry per changed tracked field between `old` and `new`.
    ///
    /// # Errors
    ///
    /// Returns the store error when staging fails.
    pub fn record_update(
        tx: &mut dyn LaneTransaction,
        old: &Task,
        new: &Task,
        actor: UserId,
    ) -> TaskStoreResult<Vec<AuditEntry>> {
        let entries = Self::diff(old, new)
            .into_iter()
            .map(|change| {
                AuditEntry::record(new.id(), actor, change, ChangeKind::Update, new.updated_at())
            })
            .collect();
        Self::append(tx, entries)
    }

    /// Stages the deletion entry for `task`.
    ///
    /// # Errors
    ///
    /// Returns the store error when staging fails.
    pub fn record_delete(
        tx: &mut dyn LaneTransaction,
        task: &Task,
        actor: UserId,
        deleted_at: DateTime<Utc>,
    ) -> TaskStoreResult<Vec<AuditEntry>> {
        let entry = AuditEntry::record(
            task.id(),
            actor,
            FieldChange {
                field: AuditField::Task,
                old_value: Some(task.title().as_str().to_owned()),
                new_value: None,
            },
            ChangeKind::Delete,
            deleted_at,
        );
        Self::append(tx, vec![entry])
    }

    fn append(
        tx: &mut dyn LaneTransaction,
        entries: Vec<AuditEntry>,
    ) -> TaskStoreResult<Vec<AuditEntry>> {
        if !entries.is_empty() {
            tx.append_audit(&entries)?;
        }
        Ok(entries)
    }
}

fn field_value(task: &Task, field: AuditField) -> Option<String> {
    match field {
        AuditField::Task | AuditField::Title => Some(task.title().as_str().to_owned()),
        AuditField::Description => task.description().map(str::to_owned),
        AuditField::Status => Some(task.status().as_str().to_owned()),
        AuditField::Priority => Some(task.priority().as_str().to_owned()),
        AuditField::DueDate => task
            .due_date()
            .map(|due| due.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        AuditField::Assignee => task.assignee().map(|assignee| assignee.to_string()),
    }
}
