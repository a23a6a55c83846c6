//! Task store behaviour against a real `PostgreSQL` database.

use crate::postgres::helpers::PgContext;
use flux_board::board::domain::{BoardId, UserId};
use flux_board::task::{
    domain::{
        ChangeKind, LaneKey, LanePosition, LaneSet, PersistedTaskData, Task, TaskId, TaskPatch,
        TaskPriority, TaskStatus, TaskTitle, lane_is_dense,
    },
    ports::{TaskStore, TaskStoreError, TransactionSettings},
    services::{
        CreateTaskRequest, DeleteTaskRequest, ErrorKind, ReorderTaskRequest, UpdateTaskRequest,
    },
};
use chrono::Utc;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use std::time::Duration;

fn lane_titles(ctx: &PgContext, board_id: BoardId, status: TaskStatus) -> Vec<String> {
    ctx.runtime
        .block_on(ctx.store.lane(LaneKey::new(board_id, status)))
        .expect("lane scan")
        .iter()
        .map(|task| task.title().as_str().to_owned())
        .collect()
}

fn assert_board_dense(ctx: &PgContext, board_id: BoardId) {
    for status in TaskStatus::ALL {
        let lane = ctx
            .runtime
            .block_on(ctx.store.lane(LaneKey::new(board_id, status)))
            .expect("lane scan");
        assert!(lane_is_dense(lane.iter().map(Task::position)), "lane {status} not dense");
    }
}

fn create(ctx: &PgContext, board_id: BoardId, actor: UserId, title: &str, status: TaskStatus) -> Task {
    ctx.runtime
        .block_on(
            ctx.service
                .create(CreateTaskRequest::new(board_id, actor, title).with_status(status)),
        )
        .expect("create should succeed")
}

#[rstest]
fn mutations_keep_lanes_dense_and_audit_survives_delete(
    shared_test_cluster: &'static TestCluster,
) {
    let ctx = PgContext::new(shared_test_cluster, TransactionSettings::default());
    let owner = UserId::new();
    let board_id = ctx.add_board(owner);

    let first = create(&ctx, board_id, owner, "T1", TaskStatus::ToDo);
    create(&ctx, board_id, owner, "T2", TaskStatus::ToDo);
    let third = create(&ctx, board_id, owner, "T3", TaskStatus::ToDo);

    ctx.runtime
        .block_on(ctx.service.update(UpdateTaskRequest::new(
            third.id(),
            owner,
            TaskPatch::new()
                .with_status(TaskStatus::InProgress)
                .with_priority(TaskPriority::Urgent),
        )))
        .expect("update should succeed");
    ctx.runtime
        .block_on(ctx.service.delete(DeleteTaskRequest::new(first.id(), owner)))
        .expect("delete should succeed");

    assert_eq!(lane_titles(&ctx, board_id, TaskStatus::ToDo), ["T2"]);
    assert_eq!(lane_titles(&ctx, board_id, TaskStatus::InProgress), ["T3"]);
    assert_board_dense(&ctx, board_id);

    let moved_history = ctx
        .runtime
        .block_on(ctx.store.audit_history(third.id()))
        .expect("history");
    let kinds: Vec<_> = moved_history.iter().map(|entry| entry.kind()).collect();
    assert_eq!(
        kinds,
        [ChangeKind::Create, ChangeKind::Update, ChangeKind::Update]
    );

    let deleted_history = ctx
        .runtime
        .block_on(ctx.store.audit_history(first.id()))
        .expect("history");
    assert_eq!(deleted_history.len(), 2);
    assert_eq!(deleted_history[1].kind(), ChangeKind::Delete);
}

#[rstest]
fn reorder_shifts_neighbours(shared_test_cluster: &'static TestCluster) {
    let ctx = PgContext::new(shared_test_cluster, TransactionSettings::default());
    let owner = UserId::new();
    let board_id = ctx.add_board(owner);
    for title in ["a", "b", "c", "d"] {
        create(&ctx, board_id, owner, title, TaskStatus::Review);
    }
    let last = ctx
        .runtime
        .block_on(ctx.store.lane(LaneKey::new(board_id, TaskStatus::Review)))
        .expect("lane scan")[3]
        .clone();

    let moved = ctx
        .runtime
        .block_on(ctx.service.reorder(ReorderTaskRequest::new(
            last.id(),
            owner,
            LanePosition::FIRST,
        )))
        .expect("reorder should succeed");

    assert_eq!(moved.position(), LanePosition::FIRST);
    assert_eq!(
        lane_titles(&ctx, board_id, TaskStatus::Review),
        ["d", "a", "b", "c"]
    );
}

#[rstest]
fn concurrent_creates_receive_distinct_positions(shared_test_cluster: &'static TestCluster) {
    let ctx = PgContext::new(shared_test_cluster, TransactionSettings::default());
    let owner = UserId::new();
    let board_id = ctx.add_board(owner);

    let results = ctx.runtime.block_on(async {
        let handles: Vec<_> = (0..5)
            .map(|index| {
                let service = ctx.service.clone();
                tokio::spawn(async move {
                    service
                        .create(CreateTaskRequest::new(board_id, owner, format!("racer {index}")))
                        .await
                })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.expect("task should not panic"));
        }
        results
    });

    for result in &results {
        assert!(
            result
                .as_ref()
                .err()
                .is_none_or(|err| err.kind() == ErrorKind::Conflict),
            "unexpected outcome: {result:?}"
        );
    }
    let committed = results.iter().filter(|result| result.is_ok()).count();
    let lane = ctx
        .runtime
        .block_on(ctx.store.lane(LaneKey::new(board_id, TaskStatus::ToDo)))
        .expect("lane scan");
    assert_eq!(lane.len(), committed);
    assert!(lane_is_dense(lane.iter().map(Task::position)));
}

#[rstest]
fn failed_unit_leaves_no_trace(shared_test_cluster: &'static TestCluster) {
    let ctx = PgContext::new(shared_test_cluster, TransactionSettings::default());
    let owner = UserId::new();
    let board_id = ctx.add_board(owner);
    let survivor = create(&ctx, board_id, owner, "survivor", TaskStatus::ToDo);
    let lane = LaneKey::new(board_id, TaskStatus::ToDo);

    let result = ctx.runtime.block_on(ctx.store.transact(LaneSet::single(lane), move |tx| {
        tx.delete_task(survivor.id())?;
        Err::<(), _>(TaskStoreError::conflict("abandoned on purpose"))
    }));

    assert!(matches!(result, Err(TaskStoreError::Conflict(_))));
    assert_eq!(lane_titles(&ctx, board_id, TaskStatus::ToDo), ["survivor"]);
}

#[rstest]
fn task_on_unknown_board_is_rejected(shared_test_cluster: &'static TestCluster) {
    let ctx = PgContext::new(shared_test_cluster, TransactionSettings::default());
    let missing = BoardId::new();
    let now = Utc::now();
    let orphan = Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        board_id: missing,
        title: TaskTitle::new("orphan").expect("valid title"),
        description: None,
        status: TaskStatus::ToDo,
        priority: TaskPriority::Low,
        position: LanePosition::FIRST,
        due_date: None,
        creator: UserId::new(),
        assignee: None,
        created_at: now,
        updated_at: now,
    });

    let result = ctx.runtime.block_on(ctx.store.transact(
        LaneSet::single(LaneKey::new(missing, TaskStatus::ToDo)),
        move |tx| tx.insert_task(&orphan),
    ));

    assert!(matches!(result, Err(TaskStoreError::UnknownBoard(id)) if id == missing));
}

#[rstest]
fn lock_wait_past_timeout_is_a_conflict(shared_test_cluster: &'static TestCluster) {
    let ctx = PgContext::new(shared_test_cluster, TransactionSettings::with_lock_timeout_ms(200));
    let owner = UserId::new();
    let board_id = ctx.add_board(owner);
    let lane = LaneKey::new(board_id, TaskStatus::ToDo);

    let outcome = ctx.runtime.block_on(async {
        let holder_store = std::sync::Arc::clone(&ctx.store);
        let holder = tokio::spawn(async move {
            holder_store
                .transact(LaneSet::single(lane), |_tx| {
                    std::thread::sleep(Duration::from_millis(1_500));
                    Ok::<_, TaskStoreError>(())
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        let waiter = ctx
            .store
            .transact(LaneSet::single(lane), |tx| tx.lane_len(lane))
            .await;
        let held = holder.await.expect("holder should not panic");
        (held, waiter)
    });

    assert!(outcome.0.is_ok());
    assert!(matches!(outcome.1, Err(TaskStoreError::Conflict(_))));
}
