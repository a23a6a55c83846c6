//! `PostgreSQL` task store: one Diesel transaction per atomic unit.

use super::{
    models::{AuditRow, NewAuditRow, NewTaskRow, TaskChangeset, TaskRow},
    schema::{task_audit_log, tasks},
};
use crate::board::domain::{BoardId, UserId};
use crate::task::{
    domain::{
        AuditEntry, AuditEntryId, AuditField, ChangeKind, LaneKey, LanePosition, LaneSet,
        LaneSpan, PersistedAuditEntry, PersistedTaskData, ShiftDirection, Task, TaskId,
        TaskPriority, TaskStatus, TaskTitle,
    },
    ports::{LaneTransaction, TaskStore, TaskStoreError, TaskStoreResult, TransactionSettings},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Deferred unique constraint keeping lane positions distinct.
const LANE_POSITION_CONSTRAINT: &str = "tasks_lane_position_unique";

/// Foreign key from tasks to boards.
const TASK_BOARD_CONSTRAINT: &str = "tasks_board_id_fkey";

/// `PostgreSQL`-backed task store.
///
/// Lanes are serialized with transaction-scoped advisory locks taken in
/// ascending lane order. Positions may collide transiently while a lane is
/// being shifted; the unique constraint is checked at commit.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
    settings: TransactionSettings,
}

impl PostgresTaskStore {
    /// Creates a store with default transaction settings.
    #[must_use]
    pub fn new(pool: TaskPgPool) -> Self {
        Self::with_settings(pool, TransactionSettings::default())
    }

    /// Creates a store with explicit transaction settings.
    #[must_use]
    pub const fn with_settings(pool: TaskPgPool, settings: TransactionSettings) -> Self {
        Self { pool, settings }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| find_task(connection, id))
            .await
    }

    async fn lane(&self, lane: LaneKey) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| lane_rows(connection, lane))
            .await
    }

    async fn board_tasks(&self, board_id: BoardId) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::board_id.eq(board_id.into_inner()))
                .order((tasks::status.asc(), tasks::position.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn tasks_assigned_to(&self, user_id: UserId) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::assignee_id.eq(user_id.into_inner()))
                .order((
                    tasks::board_id.asc(),
                    tasks::status.asc(),
                    tasks::position.asc(),
                ))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn audit_history(&self, task_id: TaskId) -> TaskStoreResult<Vec<AuditEntry>> {
        self.run_blocking(move |connection| {
            let rows = task_audit_log::table
                .filter(task_audit_log::task_id.eq(task_id.into_inner()))
                .order(task_audit_log::seq.asc())
                .select(AuditRow::as_select())
                .load::<AuditRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_audit_entry).collect()
        })
        .await
    }

    async fn transact<T, E, F>(&self, lanes: LaneSet, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<TaskStoreError> + Send + 'static,
        F: FnOnce(&mut dyn LaneTransaction) -> Result<T, E> + Send + 'static,
    {
        let pool = self.pool.clone();
        let settings = self.settings;
        let abandoned = AbandonOnDrop::new();
        let abandoned_flag = abandoned.flag();

        let outcome = tokio::task::spawn_blocking(move || -> Result<T, E> {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            connection
                .transaction::<T, TxFailure<E>, _>(|connection| {
                    set_lock_timeout(connection, settings)?;
                    lock_lanes(connection, &lanes)?;
                    let mut transaction = PgLaneTransaction {
                        connection,
                        lanes: &lanes,
                    };
                    let value = work(&mut transaction).map_err(TxFailure::Aborted)?;
                    if abandoned_flag.load(Ordering::Acquire) {
                        return Err(TxFailure::Abandoned);
                    }
                    Ok(value)
                })
                .map_err(|failure| match failure {
                    TxFailure::Aborted(err) => err,
                    TxFailure::Abandoned => E::from(TaskStoreError::conflict(
                        "caller stopped waiting before commit",
                    )),
                    TxFailure::Database(err) => E::from(classify(err)),
                })
        })
        .await
        .map_err(|err| E::from(TaskStoreError::persistence(err)));

        abandoned.disarm();
        outcome?
    }
}

/// Marks a transaction as abandoned when the awaiting future is dropped.
///
/// The blocking transaction checks the flag before committing and rolls back
/// when the caller is gone.
struct AbandonOnDrop {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl AbandonOnDrop {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::Release);
        }
    }
}

/// Failure of one Diesel transaction.
enum TxFailure<E> {
    /// The unit of work returned an error.
    Aborted(E),
    /// The caller dropped the future before commit.
    Abandoned,
    /// Locking, a statement outside the unit of work, or commit failed.
    Database(DieselError),
}

impl<E> From<DieselError> for TxFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

fn set_lock_timeout(
    connection: &mut PgConnection,
    settings: TransactionSettings,
) -> Result<(), DieselError> {
    diesel::sql_query(format!(
        "SET LOCAL lock_timeout = {}",
        settings.lock_timeout_ms
    ))
    .execute(connection)?;
    Ok(())
}

fn lock_lanes(connection: &mut PgConnection, lanes: &LaneSet) -> Result<(), DieselError> {
    for lane in lanes.iter() {
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind::<diesel::sql_types::Text, _>(lane.to_string())
            .execute(connection)?;
    }
    tracing::debug!(lanes = %lanes, "lane advisory locks acquired");
    Ok(())
}

/// Maps database failures to store errors, surfacing lost races as
/// [`TaskStoreError::Conflict`].
fn classify(err: DieselError) -> TaskStoreError {
    match &err {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
            TaskStoreError::conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if is_constraint(info.as_ref(), LANE_POSITION_CONSTRAINT) =>
        {
            TaskStoreError::conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
            if is_lock_failure(info.message()) =>
        {
            TaskStoreError::conflict(info.message().to_owned())
        }
        _ => {
            tracing::warn!(error = %err, "task store statement failed");
            TaskStoreError::persistence(err)
        }
    }
}

fn is_constraint(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

fn is_lock_failure(message: &str) -> bool {
    message.contains("lock timeout") || message.contains("deadlock detected")
}

/// Unit of work bound to an open Diesel transaction.
struct PgLaneTransaction<'conn> {
    connection: &'conn mut PgConnection,
    lanes: &'conn LaneSet,
}

impl PgLaneTransaction<'_> {
    fn ensure_locked(&self, lane: LaneKey) -> TaskStoreResult<()> {
        if self.lanes.contains(lane) {
            Ok(())
        } else {
            Err(TaskStoreError::LaneNotLocked(lane))
        }
    }

    fn existing(&mut self, id: TaskId) -> TaskStoreResult<Task> {
        find_task(self.connection, id)?.ok_or(TaskStoreError::NotFound(id))
    }
}

impl LaneTransaction for PgLaneTransaction<'_> {
    fn load_task(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        find_task(self.connection, id)
    }

    fn lane_len(&mut self, lane: LaneKey) -> TaskStoreResult<usize> {
        self.ensure_locked(lane)?;
        let count: i64 = tasks::table
            .filter(tasks::board_id.eq(lane.board_id().into_inner()))
            .filter(tasks::status.eq(lane.status().as_str()))
            .count()
            .get_result(self.connection)
            .map_err(classify)?;
        usize::try_from(count).map_err(TaskStoreError::persistence)
    }

    fn lane_tasks(&mut self, lane: LaneKey) -> TaskStoreResult<Vec<Task>> {
        self.ensure_locked(lane)?;
        lane_rows(self.connection, lane)
    }

    fn insert_task(&mut self, task: &Task) -> TaskStoreResult<()> {
        self.ensure_locked(task.lane())?;
        let task_id = task.id();
        let board_id = task.board_id();
        let row = to_new_row(task)?;
        diesel::insert_into(tasks::table)
            .values(&row)
            .execute(self.connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                    if !is_constraint(info.as_ref(), LANE_POSITION_CONSTRAINT) =>
                {
                    TaskStoreError::DuplicateTask(task_id)
                }
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
                    if is_constraint(info.as_ref(), TASK_BOARD_CONSTRAINT) =>
                {
                    TaskStoreError::UnknownBoard(board_id)
                }
                _ => classify(err),
            })?;
        Ok(())
    }

    fn update_task(&mut self, task: &Task) -> TaskStoreResult<()> {
        let current = self.existing(task.id())?;
        self.ensure_locked(current.lane())?;
        self.ensure_locked(task.lane())?;
        let changeset = to_changeset(task)?;
        diesel::update(tasks::table.find(task.id().into_inner()))
            .set(&changeset)
            .execute(self.connection)
            .map_err(classify)?;
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> TaskStoreResult<()> {
        let current = self.existing(id)?;
        self.ensure_locked(current.lane())?;
        diesel::delete(tasks::table.find(id.into_inner()))
            .execute(self.connection)
            .map_err(classify)?;
        Ok(())
    }

    fn shift_lane(
        &mut self,
        lane: LaneKey,
        span: LaneSpan,
        direction: ShiftDirection,
    ) -> TaskStoreResult<usize> {
        self.ensure_locked(lane)?;
        let start = to_column_position(span.start())?;
        let end = span.end().map_or(Ok(i32::MAX), to_column_position)?;

        if direction == ShiftDirection::TowardHead && span.start() == LanePosition::FIRST {
            let head_occupied = lane_rows(self.connection, lane)?
                .iter()
                .any(|task| task.position() == LanePosition::FIRST);
            if head_occupied {
                return Err(TaskStoreError::PositionOverflow {
                    lane,
                    position: LanePosition::FIRST,
                });
            }
        }

        let in_span = tasks::board_id
            .eq(lane.board_id().into_inner())
            .and(tasks::status.eq(lane.status().as_str()))
            .and(tasks::position.between(start, end));
        let moved = match direction {
            ShiftDirection::TowardHead => diesel::update(tasks::table.filter(in_span))
                .set(tasks::position.eq(tasks::position - 1))
                .execute(self.connection),
            ShiftDirection::TowardTail => diesel::update(tasks::table.filter(in_span))
                .set(tasks::position.eq(tasks::position + 1))
                .execute(self.connection),
        }
        .map_err(classify)?;
        Ok(moved)
    }

    fn append_audit(&mut self, entries: &[AuditEntry]) -> TaskStoreResult<()> {
        for entry in entries {
            diesel::insert_into(task_audit_log::table)
                .values(&to_audit_row(entry))
                .execute(self.connection)
                .map_err(classify)?;
        }
        Ok(())
    }
}

fn find_task(connection: &mut PgConnection, id: TaskId) -> TaskStoreResult<Option<Task>> {
    let row = tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()
        .map_err(classify)?;
    row.map(row_to_task).transpose()
}

fn lane_rows(connection: &mut PgConnection, lane: LaneKey) -> TaskStoreResult<Vec<Task>> {
    let rows = tasks::table
        .filter(tasks::board_id.eq(lane.board_id().into_inner()))
        .filter(tasks::status.eq(lane.status().as_str()))
        .order(tasks::position.asc())
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)
        .map_err(classify)?;
    rows.into_iter().map(row_to_task).collect()
}

fn to_column_position(position: LanePosition) -> TaskStoreResult<i32> {
    i32::try_from(position.value()).map_err(TaskStoreError::persistence)
}

fn to_new_row(task: &Task) -> TaskStoreResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        board_id: task.board_id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        position: to_column_position(task.position())?,
        due_date: task.due_date(),
        creator_id: task.creator().into_inner(),
        assignee_id: task.assignee().map(UserId::into_inner),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn to_changeset(task: &Task) -> TaskStoreResult<TaskChangeset> {
    Ok(TaskChangeset {
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        position: to_column_position(task.position())?,
        due_date: task.due_date(),
        assignee_id: task.assignee().map(UserId::into_inner),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let TaskRow {
        id,
        board_id,
        title,
        description,
        status,
        priority,
        position,
        due_date,
        creator_id,
        assignee_id,
        created_at,
        updated_at,
    } = row;

    let title = TaskTitle::new(title).map_err(TaskStoreError::persistence)?;
    let status = TaskStatus::try_from(status.as_str()).map_err(TaskStoreError::persistence)?;
    let priority =
        TaskPriority::try_from(priority.as_str()).map_err(TaskStoreError::persistence)?;
    let position = u32::try_from(position).map_err(TaskStoreError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        board_id: BoardId::from_uuid(board_id),
        title,
        description,
        status,
        priority,
        position: LanePosition::new(position),
        due_date,
        creator: UserId::from_uuid(creator_id),
        assignee: assignee_id.map(UserId::from_uuid),
        created_at,
        updated_at,
    }))
}

fn to_audit_row(entry: &AuditEntry) -> NewAuditRow {
    NewAuditRow {
        id: entry.id().into_inner(),
        task_id: entry.task_id().into_inner(),
        actor_id: entry.actor().into_inner(),
        field_name: entry.field().as_str().to_owned(),
        old_value: entry.old_value().map(str::to_owned),
        new_value: entry.new_value().map(str::to_owned),
        change_kind: entry.kind().as_str().to_owned(),
        recorded_at: entry.recorded_at(),
    }
}

fn row_to_audit_entry(row: AuditRow) -> TaskStoreResult<AuditEntry> {
    let field =
        AuditField::try_from(row.field_name.as_str()).map_err(TaskStoreError::persistence)?;
    let kind =
        ChangeKind::try_from(row.change_kind.as_str()).map_err(TaskStoreError::persistence)?;
    Ok(AuditEntry::from_persisted(PersistedAuditEntry {
        id: AuditEntryId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        actor: UserId::from_uuid(row.actor_id),
        field,
        old_value: row.old_value,
        new_value: row.new_value,
        kind,
        recorded_at: row.recorded_at,
    }))
}
