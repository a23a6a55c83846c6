//! Board and user statistics over committed task state.

use super::coordinator::{TaskMutationError, TaskMutationResult};
use crate::board::{
    domain::{BoardId, UserId},
    ports::BoardRepository,
};
use crate::task::{
    domain::{BoardStatistics, UserStatistics},
    ports::TaskStore,
};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;

/// Read-only statistics service.
///
/// Queries never lock lanes; they see the latest committed snapshot.
pub struct BoardStatisticsService<S, B, C>
where
    S: TaskStore,
    B: BoardRepository,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    boards: Arc<B>,
    clock: Arc<C>,
}

impl<S, B, C> Clone for BoardStatisticsService<S, B, C>
where
    S: TaskStore,
    B: BoardRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            boards: Arc::clone(&self.boards),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, B, C> BoardStatisticsService<S, B, C>
where
    S: TaskStore,
    B: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates a statistics service.
    #[must_use]
    pub const fn new(store: Arc<S>, boards: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            store,
            boards,
            clock,
        }
    }

    /// Computes the rollup of a board's current tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::BoardNotFound`] for an unknown board.
    pub async fn board_statistics(&self, board_id: BoardId) -> TaskMutationResult<BoardStatistics> {
        if !self.boards.exists(board_id).await? {
            return Err(TaskMutationError::BoardNotFound(board_id));
        }
        let tasks = self.store.board_tasks(board_id).await?;
        Ok(BoardStatistics::from_tasks(board_id, &tasks, self.clock.utc()))
    }

    /// Computes the rollup of the tasks assigned to a user on the boards
    /// they belong to.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] or
    /// [`TaskMutationError::BoardLookup`] when a lookup fails.
    pub async fn user_statistics(&self, user_id: UserId) -> TaskMutationResult<UserStatistics> {
        let boards: HashSet<BoardId> = self
            .boards
            .boards_for_member(user_id)
            .await?
            .into_iter()
            .collect();
        let tasks: Vec<_> = self
            .store
            .tasks_assigned_to(user_id)
            .await?
            .into_iter()
            .filter(|task| boards.contains(&task.board_id()))
            .collect();
        Ok(UserStatistics::from_tasks(user_id, &tasks, self.clock.utc()))
    }
}
