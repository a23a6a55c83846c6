//! Given steps for task lane BDD scenarios.

use super::world::{LaneWorld, run_async, titles};
use eyre::WrapErr;
use flux_board::board::{
    domain::{Board, BoardMember, BoardName, MemberRole, UserId},
    ports::BoardRepository,
};
use flux_board::task::{domain::TaskStatus, services::CreateTaskRequest};
use mockable::DefaultClock;
use rstest_bdd_macros::given;

#[given("a board with an owner")]
fn board_with_owner(world: &mut LaneWorld) -> Result<(), eyre::Report> {
    let owner = UserId::new();
    let board = Board::new(BoardName::new("Scenario board")?, owner, &DefaultClock);
    run_async(world.boards.store(&board)).wrap_err("store scenario board")?;
    run_async(world.boards.add_member(&BoardMember::new(
        board.id(),
        owner,
        MemberRole::Owner,
        &DefaultClock,
    )))
    .wrap_err("register scenario board owner")?;
    world.board = Some((board.id(), owner));
    Ok(())
}

#[given(r#"the "{status}" lane holds "{list}""#)]
fn lane_holds(world: &mut LaneWorld, status: String, list: String) -> Result<(), eyre::Report> {
    let (board_id, owner) = world.board()?;
    let status = TaskStatus::try_from(status.as_str())?;
    for title in titles(&list) {
        let task = run_async(
            world
                .service
                .create(CreateTaskRequest::new(board_id, owner, title.clone()).with_status(status)),
        )
        .wrap_err_with(|| format!("create scenario task {title}"))?;
        world.tasks.insert(title, task.id());
    }
    Ok(())
}
