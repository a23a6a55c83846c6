//! Audit ordering and statistics over committed state.

use crate::in_memory::helpers::BoardFixture;
use flux_board::task::{
    domain::{AuditField, ChangeKind, TaskPatch, TaskPriority, TaskStatus},
    services::{BoardStatisticsService, DeleteTaskRequest, UpdateTaskRequest},
};
use mockable::DefaultClock;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn history_lists_every_mutation_in_commit_order() {
    let fixture = BoardFixture::new().await;
    let task = fixture.create("Write changelog", TaskStatus::ToDo).await;

    fixture
        .service
        .update(UpdateTaskRequest::new(
            task.id(),
            fixture.owner,
            TaskPatch::new()
                .with_title("Write the changelog")
                .with_priority(TaskPriority::Urgent),
        ))
        .await
        .expect("first update should succeed");
    fixture
        .service
        .update(UpdateTaskRequest::new(
            task.id(),
            fixture.owner,
            TaskPatch::new().with_status(TaskStatus::Review),
        ))
        .await
        .expect("second update should succeed");
    fixture
        .service
        .delete(DeleteTaskRequest::new(task.id(), fixture.owner))
        .await
        .expect("delete should succeed");

    let history = fixture
        .service
        .audit_history(task.id())
        .await
        .expect("history should load");
    let summary: Vec<(ChangeKind, AuditField)> = history
        .iter()
        .map(|entry| (entry.kind(), entry.field()))
        .collect();

    assert_eq!(
        summary,
        [
            (ChangeKind::Create, AuditField::Task),
            (ChangeKind::Update, AuditField::Title),
            (ChangeKind::Update, AuditField::Priority),
            (ChangeKind::Update, AuditField::Status),
            (ChangeKind::Delete, AuditField::Task),
        ]
    );
    assert!(
        history
            .windows(2)
            .all(|pair| pair.first().map(|entry| entry.recorded_at())
                <= pair.last().map(|entry| entry.recorded_at()))
    );
    let status_change = history
        .iter()
        .find(|entry| entry.field() == AuditField::Status)
        .expect("status change should be audited");
    assert_eq!(status_change.old_value(), Some("TO_DO"));
    assert_eq!(status_change.new_value(), Some("REVIEW"));
}

#[tokio::test(flavor = "multi_thread")]
async fn statistics_see_only_committed_state() {
    let fixture = BoardFixture::new().await;
    let stats = BoardStatisticsService::new(
        Arc::clone(&fixture.store),
        Arc::clone(&fixture.boards),
        Arc::new(DefaultClock),
    );
    fixture.create("One", TaskStatus::ToDo).await;
    let two = fixture.create("Two", TaskStatus::ToDo).await;

    fixture.store.inject_write_failure_after(0);
    fixture
        .service
        .update(UpdateTaskRequest::new(
            two.id(),
            fixture.owner,
            TaskPatch::new().with_status(TaskStatus::Done),
        ))
        .await
        .expect_err("injected failure should abort the move");

    let rollup = stats
        .board_statistics(fixture.board_id)
        .await
        .expect("statistics should load");
    assert_eq!(rollup.total, 2);
    assert_eq!(rollup.by_status.to_do, 2);
    assert_eq!(rollup.by_status.done, 0);
}
