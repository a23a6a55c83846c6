//! When steps for task lane BDD scenarios.

use super::world::{LaneWorld, run_async};
use eyre::WrapErr;
use flux_board::board::domain::UserId;
use flux_board::task::{
    domain::{TaskPatch, TaskPriority, TaskStatus},
    services::{CreateTaskRequest, DeleteTaskRequest, UpdateTaskRequest},
};
use rstest_bdd_macros::when;

#[when(r#"task "{title}" is deleted"#)]
fn delete_task(world: &mut LaneWorld, title: String) -> Result<(), eyre::Report> {
    let (_, owner) = world.board()?;
    let task_id = world.task(&title)?;
    run_async(world.service.delete(DeleteTaskRequest::new(task_id, owner)))
        .wrap_err("delete scenario task")?;
    world.tasks.remove(&title);
    Ok(())
}

#[when(r#"task "{title}" is moved to "{status}""#)]
fn move_task(world: &mut LaneWorld, title: String, status: String) -> Result<(), eyre::Report> {
    let (_, owner) = world.board()?;
    let task_id = world.task(&title)?;
    let status = TaskStatus::try_from(status.as_str())?;
    run_async(world.service.update(UpdateTaskRequest::new(
        task_id,
        owner,
        TaskPatch::new().with_status(status),
    )))
    .wrap_err("move scenario task")?;
    Ok(())
}

#[when(r#"task "{title}" gets priority "{priority}" with its title unchanged"#)]
fn reprioritise_task(
    world: &mut LaneWorld,
    title: String,
    priority: String,
) -> Result<(), eyre::Report> {
    let (_, owner) = world.board()?;
    let task_id = world.task(&title)?;
    let priority = TaskPriority::try_from(priority.as_str())?;
    run_async(world.service.update(UpdateTaskRequest::new(
        task_id,
        owner,
        TaskPatch::new().with_priority(priority).with_title(title),
    )))
    .wrap_err("reprioritise scenario task")?;
    Ok(())
}

#[when(r#"{count:usize} tasks are created concurrently in "{status}""#)]
fn create_concurrently(
    world: &mut LaneWorld,
    count: usize,
    status: String,
) -> Result<(), eyre::Report> {
    let (board_id, owner) = world.board()?;
    let status = TaskStatus::try_from(status.as_str())?;
    let service = world.service.clone();
    let created = run_async(async move {
        let handles: Vec<_> = (0..count)
            .map(|index| {
                let service = service.clone();
                let request = CreateTaskRequest::new(board_id, owner, format!("racer {index}"))
                    .with_status(status);
                tokio::spawn(async move { service.create(request).await })
            })
            .collect();
        let mut created = Vec::with_capacity(handles.len());
        for handle in handles {
            created.push(handle.await??);
        }
        Ok::<_, eyre::Report>(created)
    })?;
    for task in created {
        world
            .tasks
            .insert(task.title().as_str().to_owned(), task.id());
    }
    Ok(())
}

#[when(r#"task "{title}" is assigned to a user outside the board"#)]
fn assign_outsider(world: &mut LaneWorld, title: String) -> Result<(), eyre::Report> {
    let (_, owner) = world.board()?;
    let task_id = world.task(&title)?;
    let result = run_async(world.service.update(UpdateTaskRequest::new(
        task_id,
        owner,
        TaskPatch::new().with_assignee(UserId::new()),
    )));
    world.last_error = result.err();
    Ok(())
}
