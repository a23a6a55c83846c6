//! Then steps for task lane BDD scenarios.

use super::world::{LaneWorld, run_async, titles};
use flux_board::task::{
    domain::{AuditField, ChangeKind, LaneKey, LanePosition, Task, TaskStatus, lane_is_dense},
    ports::TaskStore,
    services::ErrorKind,
};
use rstest_bdd_macros::then;
use std::collections::HashSet;

fn lane_of(world: &LaneWorld, status: &str) -> Result<Vec<Task>, eyre::Report> {
    let (board_id, _) = world.board()?;
    let status = TaskStatus::try_from(status)?;
    Ok(run_async(world.store.lane(LaneKey::new(board_id, status)))?)
}

#[then(r#"the "{status}" lane reads "{list}""#)]
fn lane_reads(world: &LaneWorld, status: String, list: String) -> Result<(), eyre::Report> {
    let actual: Vec<String> = lane_of(world, &status)?
        .iter()
        .map(|task| task.title().as_str().to_owned())
        .collect();
    let expected = titles(&list);
    if actual != expected {
        return Err(eyre::eyre!("lane {status}: expected {expected:?}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#"task "{title}" is at position {position:u32}"#)]
fn task_at_position(world: &LaneWorld, title: String, position: u32) -> Result<(), eyre::Report> {
    let task = run_async(world.store.find_by_id(world.task(&title)?))?
        .ok_or_else(|| eyre::eyre!("task {title} no longer exists"))?;
    if task.position() != LanePosition::new(position) {
        return Err(eyre::eyre!(
            "expected {title} at {position}, found {}",
            task.position()
        ));
    }
    Ok(())
}

#[then("every lane is dense")]
fn every_lane_dense(world: &LaneWorld) -> Result<(), eyre::Report> {
    for status in TaskStatus::ALL {
        let lane = lane_of(world, status.as_str())?;
        if !lane_is_dense(lane.iter().map(Task::position)) {
            return Err(eyre::eyre!("lane {status} is not dense"));
        }
    }
    Ok(())
}

#[then(r#"task "{title}" has {count:usize} update entries"#)]
fn update_entry_count(world: &LaneWorld, title: String, count: usize) -> Result<(), eyre::Report> {
    let history = run_async(world.store.audit_history(world.task(&title)?))?;
    let updates = history
        .iter()
        .filter(|entry| entry.kind() == ChangeKind::Update)
        .count();
    if updates != count {
        return Err(eyre::eyre!("expected {count} update entries, found {updates}"));
    }
    Ok(())
}

#[then(r#"the latest entry of task "{title}" changes "{field}" from "{old}" to "{new}""#)]
fn latest_entry_changes(
    world: &LaneWorld,
    title: String,
    field: String,
    old: String,
    new: String,
) -> Result<(), eyre::Report> {
    let history = run_async(world.store.audit_history(world.task(&title)?))?;
    let latest = history
        .last()
        .ok_or_else(|| eyre::eyre!("task {title} has no audit history"))?;
    let field = AuditField::try_from(field.as_str())?;
    if latest.field() != field
        || latest.old_value() != Some(old.as_str())
        || latest.new_value() != Some(new.as_str())
    {
        return Err(eyre::eyre!("unexpected latest entry {latest:?}"));
    }
    Ok(())
}

#[then(r#"the "{status}" lane holds {count:usize} tasks at distinct positions"#)]
fn lane_holds_distinct(world: &LaneWorld, status: String, count: usize) -> Result<(), eyre::Report> {
    let lane = lane_of(world, &status)?;
    let positions: HashSet<LanePosition> = lane.iter().map(Task::position).collect();
    if lane.len() != count || positions.len() != count {
        return Err(eyre::eyre!(
            "expected {count} distinct positions, found {} tasks at {} positions",
            lane.len(),
            positions.len()
        ));
    }
    Ok(())
}

#[then("the mutation fails with a validation error")]
fn mutation_fails_validation(world: &LaneWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(err) if err.kind() == ErrorKind::Validation => Ok(()),
        other => Err(eyre::eyre!("expected a validation error, got {other:?}")),
    }
}
