//! Shared fixtures for in-memory integration tests.

use flux_board::board::{
    adapters::memory::InMemoryBoardRepository,
    domain::{Board, BoardId, BoardMember, BoardName, MemberRole, UserId},
    ports::BoardRepository,
};
use flux_board::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{LaneKey, Task, TaskStatus, lane_is_dense},
    ports::{TaskStore, TransactionSettings},
    services::{CreateTaskRequest, TaskMutationService},
};
use mockable::DefaultClock;
use std::sync::Arc;

/// Service type wired to in-memory adapters.
pub type MemoryService =
    TaskMutationService<InMemoryTaskStore, InMemoryBoardRepository, DefaultClock>;

/// One board, its owner and a service over shared in-memory adapters.
pub struct BoardFixture {
    pub store: Arc<InMemoryTaskStore>,
    pub boards: Arc<InMemoryBoardRepository>,
    pub service: MemoryService,
    pub board_id: BoardId,
    pub owner: UserId,
}

impl BoardFixture {
    /// Creates a fixture with default transaction settings.
    pub async fn new() -> Self {
        Self::with_settings(TransactionSettings::default()).await
    }

    /// Creates a fixture whose store uses `settings`.
    pub async fn with_settings(settings: TransactionSettings) -> Self {
        let store = Arc::new(InMemoryTaskStore::with_settings(settings));
        let boards = Arc::new(InMemoryBoardRepository::new());
        let owner = UserId::new();
        let board_id = add_board(&boards, owner).await;
        let service = TaskMutationService::new(
            Arc::clone(&store),
            Arc::clone(&boards),
            Arc::new(DefaultClock),
        );
        Self {
            store,
            boards,
            service,
            board_id,
            owner,
        }
    }

    /// Creates a task titled `title` in `status`.
    pub async fn create(&self, title: &str, status: TaskStatus) -> Task {
        self.service
            .create(CreateTaskRequest::new(self.board_id, self.owner, title).with_status(status))
            .await
            .expect("task creation should succeed")
    }

    /// Returns a lane's committed tasks in position order.
    pub async fn lane(&self, status: TaskStatus) -> Vec<Task> {
        self.store
            .lane(LaneKey::new(self.board_id, status))
            .await
            .expect("lane scan should succeed")
    }

    /// Returns a lane's titles in position order.
    pub async fn titles(&self, status: TaskStatus) -> Vec<String> {
        self.lane(status)
            .await
            .iter()
            .map(|task| task.title().as_str().to_owned())
            .collect()
    }

    /// Asserts every lane of the board is dense.
    pub async fn assert_dense(&self) {
        for status in TaskStatus::ALL {
            let lane = self.lane(status).await;
            assert!(
                lane_is_dense(lane.iter().map(Task::position)),
                "lane {status} is not dense"
            );
        }
    }
}

/// Stores a board owned by `owner` together with the owner's membership.
pub async fn add_board(boards: &InMemoryBoardRepository, owner: UserId) -> BoardId {
    let board = Board::new(
        BoardName::new("Release board").expect("valid board name"),
        owner,
        &DefaultClock,
    );
    boards.store(&board).await.expect("board should be stored");
    boards
        .add_member(&BoardMember::new(board.id(), owner, MemberRole::Owner, &DefaultClock))
        .await
        .expect("owner should be added");
    board.id()
}
