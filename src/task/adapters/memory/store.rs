//! In-memory task store with lane locking and staged commits.

use super::lane_locks::LaneLocks;
use crate::board::domain::{BoardId, UserId};
use crate::task::{
    domain::{
        AuditEntry, LaneKey, LaneSet, LaneSpan, ShiftDirection, Task, TaskId, lane_is_dense,
    },
    ports::{LaneTransaction, TaskStore, TaskStoreError, TaskStoreResult, TransactionSettings},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Thread-safe in-memory task store.
///
/// Writes issued through a transaction are staged and applied under a single
/// write lock at commit, so readers never observe a partial unit of work.
/// Board existence is not tracked here; callers check it through the board
/// repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
    locks: Arc<LaneLocks>,
    faults: Arc<FaultInjector>,
    settings: TransactionSettings,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    audit_log: Vec<AuditEntry>,
}

/// One-shot write failure armed by tests.
#[derive(Debug, Default)]
struct FaultInjector {
    remaining_writes: Mutex<Option<usize>>,
}

impl FaultInjector {
    fn arm(&self, successful_writes: usize) {
        *self
            .remaining_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(successful_writes);
    }

    fn on_write(&self) -> TaskStoreResult<()> {
        let mut remaining = self
            .remaining_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *remaining {
            Some(0) => {
                *remaining = None;
                Err(TaskStoreError::persistence(std::io::Error::other(
                    "injected write failure",
                )))
            }
            Some(count) => {
                *remaining = Some(count.saturating_sub(1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl InMemoryTaskStore {
    /// Creates an empty store with default transaction settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given transaction settings.
    #[must_use]
    pub fn with_settings(settings: TransactionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Makes the write following `successful_writes` further staged writes
    /// fail with a persistence error. The failure fires once.
    pub fn inject_write_failure_after(&self, successful_writes: usize) {
        self.faults.arm(successful_writes);
    }

    fn read_tasks<F>(&self, keep: F) -> TaskStoreResult<Vec<Task>>
    where
        F: Fn(&Task) -> bool,
    {
        let state = self.state.read().map_err(poisoned)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| keep(task))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.board_id(), task.status(), task.position(), task.id()));
        Ok(tasks)
    }
}

fn poisoned(err: impl ToString) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn lane(&self, lane: LaneKey) -> TaskStoreResult<Vec<Task>> {
        self.read_tasks(|task| task.lane() == lane)
    }

    async fn board_tasks(&self, board_id: BoardId) -> TaskStoreResult<Vec<Task>> {
        self.read_tasks(|task| task.board_id() == board_id)
    }

    async fn tasks_assigned_to(&self, user_id: UserId) -> TaskStoreResult<Vec<Task>> {
        self.read_tasks(|task| task.assignee() == Some(user_id))
    }

    async fn audit_history(&self, task_id: TaskId) -> TaskStoreResult<Vec<AuditEntry>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .audit_log
            .iter()
            .filter(|entry| entry.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn transact<T, E, F>(&self, lanes: LaneSet, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<TaskStoreError> + Send + 'static,
        F: FnOnce(&mut dyn LaneTransaction) -> Result<T, E> + Send + 'static,
    {
        let _guards = self
            .locks
            .acquire(&lanes, self.settings.lock_timeout())
            .await?;

        let mut transaction = StagedTransaction {
            state: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
            lanes,
            staged: HashMap::new(),
            audit: Vec::new(),
        };
        let value = work(&mut transaction)?;
        transaction.commit()?;
        Ok(value)
    }
}

/// Write set of one atomic unit, overlaid on committed state.
struct StagedTransaction {
    state: Arc<RwLock<InMemoryTaskState>>,
    faults: Arc<FaultInjector>,
    lanes: LaneSet,
    staged: HashMap<TaskId, Option<Task>>,
    audit: Vec<AuditEntry>,
}

impl StagedTransaction {
    fn ensure_locked(&self, lane: LaneKey) -> TaskStoreResult<()> {
        if self.lanes.contains(lane) {
            Ok(())
        } else {
            Err(TaskStoreError::LaneNotLocked(lane))
        }
    }

    fn stage(&mut self, id: TaskId, task: Option<Task>) -> TaskStoreResult<()> {
        self.faults.on_write()?;
        self.staged.insert(id, task);
        Ok(())
    }

    fn lane_view(&self, lane: LaneKey) -> TaskStoreResult<Vec<Task>> {
        self.ensure_locked(lane)?;
        let mut members: HashMap<TaskId, Task> = {
            let state = self.state.read().map_err(poisoned)?;
            state
                .tasks
                .values()
                .filter(|task| task.lane() == lane)
                .map(|task| (task.id(), task.clone()))
                .collect()
        };
        for (id, staged) in &self.staged {
            match staged {
                Some(task) if task.lane() == lane => {
                    members.insert(*id, task.clone());
                }
                _ => {
                    members.remove(id);
                }
            }
        }

        let mut tasks: Vec<Task> = members.into_values().collect();
        tasks.sort_by_key(|task| (task.position(), task.id()));
        Ok(tasks)
    }

    fn commit(self) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let writes = self.staged.len();
        for (id, staged) in self.staged {
            match staged {
                Some(task) => {
                    state.tasks.insert(id, task);
                }
                None => {
                    state.tasks.remove(&id);
                }
            }
        }
        debug_assert!(
            self.lanes.iter().all(|lane| lane_is_dense(
                state
                    .tasks
                    .values()
                    .filter(|task| task.lane() == lane)
                    .map(Task::position)
            )),
            "commit left a gap in {}",
            self.lanes
        );
        let audited = self.audit.len();
        state.audit_log.extend(self.audit);
        tracing::debug!(lanes = %self.lanes, writes, audited, "in-memory transaction committed");
        Ok(())
    }
}

impl LaneTransaction for StagedTransaction {
    fn load_task(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(staged.clone());
        }
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    fn lane_len(&mut self, lane: LaneKey) -> TaskStoreResult<usize> {
        Ok(self.lane_view(lane)?.len())
    }

    fn lane_tasks(&mut self, lane: LaneKey) -> TaskStoreResult<Vec<Task>> {
        self.lane_view(lane)
    }

    fn insert_task(&mut self, task: &Task) -> TaskStoreResult<()> {
        self.ensure_locked(task.lane())?;
        if self.load_task(task.id())?.is_some() {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        self.stage(task.id(), Some(task.clone()))
    }

    fn update_task(&mut self, task: &Task) -> TaskStoreResult<()> {
        let id = task.id();
        let current = self.load_task(id)?.ok_or(TaskStoreError::NotFound(id))?;
        self.ensure_locked(current.lane())?;
        self.ensure_locked(task.lane())?;
        self.stage(id, Some(task.clone()))
    }

    fn delete_task(&mut self, id: TaskId) -> TaskStoreResult<()> {
        let current = self.load_task(id)?.ok_or(TaskStoreError::NotFound(id))?;
        self.ensure_locked(current.lane())?;
        self.stage(id, None)
    }

    fn shift_lane(
        &mut self,
        lane: LaneKey,
        span: LaneSpan,
        direction: ShiftDirection,
    ) -> TaskStoreResult<usize> {
        let affected: Vec<Task> = self
            .lane_view(lane)?
            .into_iter()
            .filter(|task| span.contains(task.position()))
            .collect();
        let moved = affected.len();
        for mut task in affected {
            let position = task.position();
            let shifted = direction
                .apply(position)
                .ok_or(TaskStoreError::PositionOverflow { lane, position })?;
            task.reposition(shifted);
            self.stage(task.id(), Some(task))?;
        }
        Ok(moved)
    }

    fn append_audit(&mut self, entries: &[AuditEntry]) -> TaskStoreResult<()> {
        self.faults.on_write()?;
        self.audit.extend_from_slice(entries);
        Ok(())
    }
}
