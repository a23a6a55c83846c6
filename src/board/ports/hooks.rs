//! Collaborator hook invoked after a board has been created.

use super::BoardRepositoryResult;
use crate::board::domain::Board;
use async_trait::async_trait;

/// Reaction to board creation, run outside the task mutation pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardCreationHook: Send + Sync {
    /// Handles a freshly stored board.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the hook's own persistence fails.
    async fn on_board_created(&self, board: &Board) -> BoardRepositoryResult<()>;
}
