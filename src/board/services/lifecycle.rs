//! Service layer for board creation and membership.

use crate::board::{
    domain::{Board, BoardDomainError, BoardId, BoardMember, BoardName, MemberRole, UserId},
    ports::{BoardCreationHook, BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBoardRequest {
    name: String,
    owner: UserId,
    description: Option<String>,
}

impl CreateBoardRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        Self {
            name: name.into(),
            owner,
            description: None,
        }
    }

    /// Sets the board description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Service-level errors for board lifecycle operations.
#[derive(Debug, Error)]
pub enum BoardLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),
    /// Repository or hook operation failed.
    #[error(transparent)]
    Repository(#[from] BoardRepositoryError),
}

/// Result type for board lifecycle service operations.
pub type BoardLifecycleResult<T> = Result<T, BoardLifecycleError>;

/// Board lifecycle orchestration service.
#[derive(Clone)]
pub struct BoardLifecycleService<R, H, C>
where
    R: BoardRepository,
    H: BoardCreationHook,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    hook: Arc<H>,
    clock: Arc<C>,
}

impl<R, H, C> BoardLifecycleService<R, H, C>
where
    R: BoardRepository,
    H: BoardCreationHook,
    C: Clock + Send + Sync,
{
    /// Creates a new board lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, hook: Arc<H>, clock: Arc<C>) -> Self {
        Self {
            repository,
            hook,
            clock,
        }
    }

    /// Creates and stores a board, then runs the creation hook.
    ///
    /// # Errors
    ///
    /// Returns [`BoardLifecycleError`] when the name is invalid, the
    /// repository rejects the board, or the hook fails.
    pub async fn create_board(&self, request: CreateBoardRequest) -> BoardLifecycleResult<Board> {
        let name = BoardName::new(request.name)?;
        let mut board = Board::new(name, request.owner, &*self.clock);
        if let Some(description) = request.description {
            board = board.with_description(description);
        }

        self.repository.store(&board).await?;
        self.hook.on_board_created(&board).await?;
        tracing::info!(board_id = %board.id(), owner = %board.owner(), "board created");
        Ok(board)
    }

    /// Adds a regular member to an existing board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::NotFound`] for an unknown board and
    /// [`BoardRepositoryError::DuplicateMember`] for an existing member.
    pub async fn add_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> BoardLifecycleResult<BoardMember> {
        let member = BoardMember::new(board_id, user_id, MemberRole::Member, &*self.clock);
        self.repository.add_member(&member).await?;
        Ok(member)
    }

    /// Retrieves a board by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardLifecycleError::Repository`] when the lookup fails.
    pub async fn find_board(&self, board_id: BoardId) -> BoardLifecycleResult<Option<Board>> {
        Ok(self.repository.find_by_id(board_id).await?)
    }
}

/// Default creation hook: registers the owner as an `OWNER` member.
#[derive(Clone)]
pub struct OwnerMembershipHook<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> OwnerMembershipHook<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates the hook over the repository that stores memberships.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl<R, C> BoardCreationHook for OwnerMembershipHook<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    async fn on_board_created(&self, board: &Board) -> BoardRepositoryResult<()> {
        let member = BoardMember::new(board.id(), board.owner(), MemberRole::Owner, &*self.clock);
        self.repository.add_member(&member).await
    }
}
