//! Lane addressing: which tasks share an ordering and how it shifts.

use super::{LanePosition, TaskStatus};
use crate::board::domain::BoardId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The `(board, status)` pair that scopes a dense position sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneKey {
    board_id: BoardId,
    status: TaskStatus,
}

impl LaneKey {
    /// Creates a lane key.
    #[must_use]
    pub const fn new(board_id: BoardId, status: TaskStatus) -> Self {
        Self { board_id, status }
    }

    /// Returns the board the lane belongs to.
    #[must_use]
    pub const fn board_id(self) -> BoardId {
        self.board_id
    }

    /// Returns the status the lane collects.
    #[must_use]
    pub const fn status(self) -> TaskStatus {
        self.status
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.board_id, self.status)
    }
}

/// Lanes one atomic unit holds exclusively.
///
/// Iteration order is ascending, which is also the lock acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneSet(BTreeSet<LaneKey>);

impl LaneSet {
    /// Creates a set holding a single lane.
    #[must_use]
    pub fn single(lane: LaneKey) -> Self {
        Self(BTreeSet::from([lane]))
    }

    /// Creates a set holding both lanes; equal lanes collapse into one.
    #[must_use]
    pub fn pair(first: LaneKey, second: LaneKey) -> Self {
        Self(BTreeSet::from([first, second]))
    }

    /// Returns `true` when the lane is part of the set.
    #[must_use]
    pub fn contains(&self, lane: LaneKey) -> bool {
        self.0.contains(&lane)
    }

    /// Iterates lanes in lock order.
    pub fn iter(&self) -> impl Iterator<Item = LaneKey> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of distinct lanes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no lane is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LaneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{rendered}]")
    }
}

/// Inclusive range of positions affected by a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSpan {
    start: LanePosition,
    end: Option<LanePosition>,
}

impl LaneSpan {
    /// Every position from `start` to the tail of the lane.
    #[must_use]
    pub const fn from(start: LanePosition) -> Self {
        Self { start, end: None }
    }

    /// Positions from `start` to `end`, both inclusive.
    #[must_use]
    pub const fn between(start: LanePosition, end: LanePosition) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Returns the first affected position.
    #[must_use]
    pub const fn start(self) -> LanePosition {
        self.start
    }

    /// Returns the last affected position, or `None` for an open tail.
    #[must_use]
    pub const fn end(self) -> Option<LanePosition> {
        self.end
    }

    /// Returns `true` when `position` falls within the span.
    #[must_use]
    pub fn contains(self, position: LanePosition) -> bool {
        position >= self.start && self.end.is_none_or(|end| position <= end)
    }
}

/// Direction in which a span of positions moves by one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Move one slot toward the head (`position - 1`).
    TowardHead,
    /// Move one slot toward the tail (`position + 1`).
    TowardTail,
}

impl ShiftDirection {
    /// Applies the shift to a single position.
    ///
    /// Returns `None` when shifting the head toward the head.
    #[must_use]
    pub const fn apply(self, position: LanePosition) -> Option<LanePosition> {
        match self {
            Self::TowardHead => position.previous(),
            Self::TowardTail => Some(position.next()),
        }
    }
}

/// Returns `true` when the positions are exactly `{0, ..., n - 1}`.
#[must_use]
pub fn lane_is_dense(positions: impl IntoIterator<Item = LanePosition>) -> bool {
    let mut sorted: Vec<LanePosition> = positions.into_iter().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(expected, position)| usize::try_from(position.value()).is_ok_and(|v| v == expected))
}
