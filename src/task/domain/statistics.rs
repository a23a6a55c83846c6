//! Read-only rollups over committed task state.

use super::{Task, TaskPriority, TaskStatus};
use crate::board::domain::{BoardId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Task counts per workflow status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Tasks in `TO_DO`.
    pub to_do: usize,
    /// Tasks in `IN_PROGRESS`.
    pub in_progress: usize,
    /// Tasks in `REVIEW`.
    pub review: usize,
    /// Tasks in `DONE`.
    pub done: usize,
}

impl StatusCounts {
    /// Returns the count for a single status.
    #[must_use]
    pub const fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::ToDo => self.to_do,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Review => self.review,
            TaskStatus::Done => self.done,
        }
    }

    const fn increment(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::ToDo => self.to_do += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Review => self.review += 1,
            TaskStatus::Done => self.done += 1,
        }
    }
}

/// Counters shared by board and user rollups.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: usize,
    by_status: StatusCounts,
    urgent: usize,
    high: usize,
    overdue: usize,
}

impl Tally {
    fn over<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        let mut tally = Self::default();
        for task in tasks {
            tally.total += 1;
            tally.by_status.increment(task.status());
            match task.priority() {
                TaskPriority::Urgent => tally.urgent += 1,
                TaskPriority::High => tally.high += 1,
                TaskPriority::Low | TaskPriority::Medium => {}
            }
            if task.is_overdue(now) {
                tally.overdue += 1;
            }
        }
        tally
    }
}

/// Rollup of a single board's current tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardStatistics {
    /// Board the rollup describes.
    pub board_id: BoardId,
    /// Number of tasks on the board.
    pub total: usize,
    /// Tasks per status lane.
    pub by_status: StatusCounts,
    /// Tasks with `URGENT` priority.
    pub urgent: usize,
    /// Tasks with `HIGH` priority.
    pub high: usize,
    /// Unfinished tasks whose due date has passed.
    pub overdue: usize,
    /// Number of distinct assignees.
    pub distinct_assignees: usize,
}

impl BoardStatistics {
    /// Computes the rollup for `board_id` from its tasks as of `now`.
    #[must_use]
    pub fn from_tasks(board_id: BoardId, tasks: &[Task], now: DateTime<Utc>) -> Self {
        let tally = Tally::over(tasks, now);
        let distinct_assignees = tasks
            .iter()
            .filter_map(Task::assignee)
            .collect::<HashSet<_>>()
            .len();
        Self {
            board_id,
            total: tally.total,
            by_status: tally.by_status,
            urgent: tally.urgent,
            high: tally.high,
            overdue: tally.overdue,
            distinct_assignees,
        }
    }
}

/// Rollup of the tasks assigned to one user across their boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatistics {
    /// User the rollup describes.
    pub user_id: UserId,
    /// Number of assigned tasks.
    pub total: usize,
    /// Assigned tasks per status.
    pub by_status: StatusCounts,
    /// Assigned tasks with `URGENT` priority.
    pub urgent: usize,
    /// Assigned tasks with `HIGH` priority.
    pub high: usize,
    /// Assigned unfinished tasks whose due date has passed.
    pub overdue: usize,
    /// Number of distinct boards the assigned tasks span.
    pub boards: usize,
}

impl UserStatistics {
    /// Computes the rollup for `user_id` from the tasks assigned to them.
    #[must_use]
    pub fn from_tasks(user_id: UserId, tasks: &[Task], now: DateTime<Utc>) -> Self {
        let tally = Tally::over(tasks, now);
        let boards = tasks
            .iter()
            .map(Task::board_id)
            .collect::<HashSet<_>>()
            .len();
        Self {
            user_id,
            total: tally.total,
            by_status: tally.by_status,
            urgent: tally.urgent,
            high: tally.high,
            overdue: tally.overdue,
            boards,
        }
    }
}
