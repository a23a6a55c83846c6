//! Shared fixtures for task pipeline unit tests.

use std::sync::Arc;

use crate::board::{
    adapters::memory::InMemoryBoardRepository,
    domain::{Board, BoardId, BoardMember, BoardName, MemberRole, UserId},
    ports::BoardRepository,
};
use crate::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{LanePosition, Task, TaskStatus, lane_is_dense},
    services::{CreateTaskRequest, TaskMutationService},
};
use mockable::DefaultClock;

pub type TestService = TaskMutationService<InMemoryTaskStore, InMemoryBoardRepository, DefaultClock>;

/// A board with one owner, wired to an in-memory store.
pub struct Harness {
    pub store: Arc<InMemoryTaskStore>,
    pub boards: Arc<InMemoryBoardRepository>,
    pub service: TestService,
    pub board_id: BoardId,
    pub owner: UserId,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let boards = Arc::new(InMemoryBoardRepository::new());
        let service =
            TaskMutationService::new(Arc::clone(&store), Arc::clone(&boards), Arc::new(DefaultClock));
        let owner = UserId::new();
        let board_id = add_board(&boards, owner).await;
        Self {
            store,
            boards,
            service,
            board_id,
            owner,
        }
    }

    /// Creates a titled task in `status` on the harness board.
    pub async fn create(&self, title: &str, status: TaskStatus) -> Task {
        self.service
            .create(CreateTaskRequest::new(self.board_id, self.owner, title).with_status(status))
            .await
            .expect("task creation should succeed")
    }

    /// Adds a regular member to the harness board.
    pub async fn add_member(&self) -> UserId {
        let user = UserId::new();
        self.boards
            .add_member(&BoardMember::new(
                self.board_id,
                user,
                MemberRole::Member,
                &DefaultClock,
            ))
            .await
            .expect("member should be added");
        user
    }

    /// Returns the titles of a lane in position order.
    pub async fn lane_titles(&self, status: TaskStatus) -> Vec<String> {
        self.service
            .lane_contents(self.board_id, status)
            .await
            .expect("lane scan should succeed")
            .iter()
            .map(|task| task.title().as_str().to_owned())
            .collect()
    }

    /// Asserts every lane of the harness board is dense.
    pub async fn assert_dense(&self) {
        for status in TaskStatus::ALL {
            let lane = self
                .service
                .lane_contents(self.board_id, status)
                .await
                .expect("lane scan should succeed");
            assert!(
                lane_is_dense(lane.iter().map(Task::position)),
                "lane {status} is not dense: {:?}",
                lane.iter().map(Task::position).collect::<Vec<LanePosition>>()
            );
        }
    }
}

/// Stores a board owned by `owner` and registers the owner as a member.
pub async fn add_board(boards: &InMemoryBoardRepository, owner: UserId) -> BoardId {
    let board = Board::new(
        BoardName::new("Sprint board").expect("valid board name"),
        owner,
        &DefaultClock,
    );
    boards.store(&board).await.expect("board should be stored");
    boards
        .add_member(&BoardMember::new(
            board.id(),
            owner,
            MemberRole::Owner,
            &DefaultClock,
        ))
        .await
        .expect("owner should be added");
    board.id()
}
