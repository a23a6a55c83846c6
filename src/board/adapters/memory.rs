//! In-memory board repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{Board, BoardId, BoardMember, UserId},
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};

/// Thread-safe in-memory board repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardRepository {
    state: Arc<RwLock<InMemoryBoardState>>,
}

#[derive(Debug, Default)]
struct InMemoryBoardState {
    boards: HashMap<BoardId, Board>,
    members: HashMap<BoardId, HashMap<UserId, BoardMember>>,
}

impl InMemoryBoardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> BoardRepositoryError {
    BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    async fn store(&self, board: &Board) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.boards.contains_key(&board.id()) {
            return Err(BoardRepositoryError::DuplicateBoard(board.id()));
        }
        state.boards.insert(board.id(), board.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BoardId) -> BoardRepositoryResult<Option<Board>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.boards.get(&id).cloned())
    }

    async fn exists(&self, id: BoardId) -> BoardRepositoryResult<bool> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.boards.contains_key(&id))
    }

    async fn add_member(&self, member: &BoardMember) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state.boards.contains_key(&member.board_id) {
            return Err(BoardRepositoryError::NotFound(member.board_id));
        }
        let members = state.members.entry(member.board_id).or_default();
        if members.contains_key(&member.user_id) {
            return Err(BoardRepositoryError::DuplicateMember {
                board_id: member.board_id,
                user_id: member.user_id,
            });
        }
        members.insert(member.user_id, member.clone());
        Ok(())
    }

    async fn is_member(&self, board_id: BoardId, user_id: UserId) -> BoardRepositoryResult<bool> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .members
            .get(&board_id)
            .is_some_and(|members| members.contains_key(&user_id)))
    }

    async fn boards_for_member(&self, user_id: UserId) -> BoardRepositoryResult<Vec<BoardId>> {
        let state = self.state.read().map_err(poisoned)?;
        let boards: BTreeSet<BoardId> = state
            .members
            .iter()
            .filter(|(_, members)| members.contains_key(&user_id))
            .map(|(board_id, _)| *board_id)
            .collect();
        Ok(boards.into_iter().collect())
    }
}
