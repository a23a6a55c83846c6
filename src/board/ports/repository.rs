//! Repository port for board persistence and membership lookup.

use crate::board::domain::{Board, BoardId, BoardMember, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for board repository operations.
pub type BoardRepositoryResult<T> = Result<T, BoardRepositoryError>;

/// Board persistence contract.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a new board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateBoard`] when the identifier
    /// already exists.
    async fn store(&self, board: &Board) -> BoardRepositoryResult<()>;

    /// Finds a board by identifier.
    async fn find_by_id(&self, id: BoardId) -> BoardRepositoryResult<Option<Board>>;

    /// Returns `true` when the board exists.
    async fn exists(&self, id: BoardId) -> BoardRepositoryResult<bool>;

    /// Adds a member to a board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::NotFound`] when the board does not
    /// exist or [`BoardRepositoryError::DuplicateMember`] when the user is
    /// already a member.
    async fn add_member(&self, member: &BoardMember) -> BoardRepositoryResult<()>;

    /// Returns `true` when `user_id` is a member of `board_id`.
    async fn is_member(&self, board_id: BoardId, user_id: UserId) -> BoardRepositoryResult<bool>;

    /// Returns every board the user belongs to.
    async fn boards_for_member(&self, user_id: UserId) -> BoardRepositoryResult<Vec<BoardId>>;
}

/// Errors returned by board repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardRepositoryError {
    /// A board with the same identifier already exists.
    #[error("duplicate board identifier: {0}")]
    DuplicateBoard(BoardId),

    /// The user is already a member of the board.
    #[error("user {user_id} is already a member of board {board_id}")]
    DuplicateMember {
        /// Board the membership targets.
        board_id: BoardId,
        /// Existing member.
        user_id: UserId,
    },

    /// The board was not found.
    #[error("board not found: {0}")]
    NotFound(BoardId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
