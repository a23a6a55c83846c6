//! Racing mutations on shared and disjoint lanes.

use crate::in_memory::helpers::{BoardFixture, add_board};
use flux_board::board::domain::UserId;
use flux_board::task::{
    domain::{
        LaneKey, LanePosition, LaneSet, Task, TaskPatch, TaskPriority, TaskStatus, lane_is_dense,
    },
    ports::{TaskStore, TaskStoreError},
    services::{CreateTaskRequest, DeleteTaskRequest, ReorderTaskRequest, UpdateTaskRequest},
};
use mockable::DefaultClock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_creates_in_one_lane_get_distinct_positions() {
    let fixture = BoardFixture::new().await;

    let handles: Vec<_> = (0..16)
        .map(|index| {
            let service = fixture.service.clone();
            let request =
                CreateTaskRequest::new(fixture.board_id, fixture.owner, format!("racer {index}"));
            tokio::spawn(async move { service.create(request).await })
        })
        .collect();
    let mut positions = HashSet::new();
    for handle in handles {
        let task = handle
            .await
            .expect("task should not panic")
            .expect("create should succeed");
        positions.insert(task.position());
    }

    let expected: HashSet<LanePosition> = (0..16).map(LanePosition::new).collect();
    assert_eq!(positions, expected);
    fixture.assert_dense().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_moves_and_deletes_keep_every_lane_dense() {
    let fixture = BoardFixture::new().await;
    let mut seeded = Vec::new();
    for (index, status) in TaskStatus::ALL.into_iter().cycle().take(12).enumerate() {
        seeded.push(fixture.create(&format!("seed {index}"), status).await);
    }

    let handles: Vec<_> = seeded
        .iter()
        .zip((0..3).cycle())
        .map(|(task, action)| {
            let service = fixture.service.clone();
            let owner = fixture.owner;
            let task_id = task.id();
            tokio::spawn(async move {
                match action {
                    0 => service
                        .delete(DeleteTaskRequest::new(task_id, owner))
                        .await
                        .map(|_| ()),
                    1 => service
                        .update(UpdateTaskRequest::new(
                            task_id,
                            owner,
                            TaskPatch::new().with_status(TaskStatus::Done),
                        ))
                        .await
                        .map(|_| ()),
                    _ => service
                        .reorder(ReorderTaskRequest::new(task_id, owner, LanePosition::FIRST))
                        .await
                        .map(|_| ()),
                }
            })
        })
        .collect();

    for handle in handles {
        handle
            .await
            .expect("task should not panic")
            .expect("mutation should succeed");
    }
    fixture.assert_dense().await;
    let remaining = fixture
        .store
        .board_tasks(fixture.board_id)
        .await
        .expect("board scan should succeed");
    assert_eq!(remaining.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_boards_do_not_interfere() {
    let fixture = BoardFixture::new().await;
    let other_owner = UserId::new();
    let other_board = add_board(&fixture.boards, other_owner).await;

    let mut handles = Vec::new();
    for index in 0_u32..8 {
        let (board_id, owner) = if u32::is_multiple_of(index, 2) {
            (fixture.board_id, fixture.owner)
        } else {
            (other_board, other_owner)
        };
        let service = fixture.service.clone();
        handles.push(tokio::spawn(async move {
            service
                .create(CreateTaskRequest::new(board_id, owner, format!("task {index}")))
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task should not panic")
            .expect("create should succeed");
    }

    for board_id in [fixture.board_id, other_board] {
        let lane: Vec<Task> = fixture
            .store
            .lane(LaneKey::new(board_id, TaskStatus::ToDo))
            .await
            .expect("lane scan should succeed");
        assert_eq!(lane.len(), 4);
        assert!(lane_is_dense(lane.iter().map(Task::position)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_matching_a_concurrent_commit_returns_the_stored_task() {
    let fixture = BoardFixture::new().await;
    let task = fixture.create("Triage inbox", TaskStatus::ToDo).await;
    let task_id = task.id();
    let holder_store = Arc::clone(&fixture.store);

    let holder = tokio::spawn(async move {
        holder_store
            .transact(LaneSet::single(task.lane()), move |tx| {
                let current = tx.load_task(task_id)?.expect("task should exist");
                let raised = current
                    .merged_with(
                        &TaskPatch::new().with_priority(TaskPriority::High),
                        &DefaultClock,
                    )
                    .expect("patch should apply");
                tx.update_task(&raised)?;
                std::thread::sleep(Duration::from_millis(400));
                Ok::<_, TaskStoreError>(raised)
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let returned = fixture
        .service
        .update(UpdateTaskRequest::new(
            task_id,
            fixture.owner,
            TaskPatch::new().with_priority(TaskPriority::High),
        ))
        .await
        .expect("update should succeed");
    let raised = holder
        .await
        .expect("holder should not panic")
        .expect("holder should commit");
    let stored = fixture
        .store
        .find_by_id(task_id)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");

    assert_eq!(returned.priority(), TaskPriority::High);
    assert_eq!(returned, stored);
    assert_eq!(returned.updated_at(), raised.updated_at());
    let history = fixture
        .store
        .audit_history(task_id)
        .await
        .expect("history should load");
    assert_eq!(history.len(), 1, "only the creation entry is recorded");
}
