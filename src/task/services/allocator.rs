//! Lane position allocation.
//!
//! Every operation runs inside a [`LaneTransaction`] that already holds the
//! affected lanes, and leaves each touched lane dense once the caller has
//! finished the matching task write.

use crate::task::{
    domain::{LaneKey, LanePosition, LaneSpan, ShiftDirection, TaskDomainError, TaskId},
    ports::{LaneTransaction, TaskStoreError, TaskStoreResult},
};
use thiserror::Error;

/// Failures of a position computation.
#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    /// The requested slot is outside the lane.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The store rejected a read or shift.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Computes and maintains dense positions within lanes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanePositionAllocator;

impl LanePositionAllocator {
    /// Returns the tail slot for a task about to be inserted into `lane`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::LaneNotLocked`] when the lane is not held and
    /// [`TaskStoreError::PositionOverflow`] when the lane cannot grow.
    pub fn allocate_on_insert(
        tx: &mut dyn LaneTransaction,
        lane: LaneKey,
    ) -> TaskStoreResult<LanePosition> {
        let size = tx.lane_len(lane)?;
        let position = LanePosition::tail_of(size).ok_or(TaskStoreError::PositionOverflow {
            lane,
            position: LanePosition::new(u32::MAX),
        })?;
        tracing::debug!(%lane, %position, "allocated tail position");
        Ok(position)
    }

    /// Closes the gap left by a task leaving `removed` in `lane`.
    ///
    /// Only tasks after `removed` move, so the departing task may still be
    /// stored when this runs.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the shift fails.
    pub fn close_gap(
        tx: &mut dyn LaneTransaction,
        lane: LaneKey,
        removed: LanePosition,
    ) -> TaskStoreResult<()> {
        let moved = tx.shift_lane(
            lane,
            LaneSpan::from(removed.next()),
            ShiftDirection::TowardHead,
        )?;
        tracing::debug!(%lane, %removed, moved, "closed lane gap");
        Ok(())
    }

    /// Computes the position of a task whose lane may be changing.
    ///
    /// Within the same lane the old position is kept. Across lanes the gap
    /// in the source lane is closed and the task goes to the tail of the
    /// destination lane. Call before the task is rewritten into `to` so it
    /// is not counted in the destination.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when a read or shift fails.
    pub fn relocate(
        tx: &mut dyn LaneTransaction,
        from: LaneKey,
        old_position: LanePosition,
        to: LaneKey,
    ) -> TaskStoreResult<LanePosition> {
        if from == to {
            return Ok(old_position);
        }
        Self::close_gap(tx, from, old_position)?;
        Self::allocate_on_insert(tx, to)
    }

    /// Opens `target` in the task's lane by shifting the tasks between the
    /// old and new slot, and returns the target.
    ///
    /// The task itself is not rewritten here; the caller stores it at the
    /// returned position within the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PositionOutOfRange`] when `target` is not in
    /// `[0, lane size - 1]`, or [`AllocationError::Store`] when a shift fails.
    pub fn reorder(
        tx: &mut dyn LaneTransaction,
        task_id: TaskId,
        lane: LaneKey,
        old_position: LanePosition,
        target: LanePosition,
    ) -> Result<LanePosition, AllocationError> {
        let lane_size = tx.lane_len(lane)?;
        if !target.is_within(lane_size) {
            return Err(TaskDomainError::PositionOutOfRange {
                task_id,
                requested: target,
                lane_size,
            }
            .into());
        }

        if target > old_position {
            tx.shift_lane(
                lane,
                LaneSpan::between(old_position.next(), target),
                ShiftDirection::TowardHead,
            )?;
        } else if let Some(before_old) = old_position.previous().filter(|_| target < old_position)
        {
            tx.shift_lane(
                lane,
                LaneSpan::between(target, before_old),
                ShiftDirection::TowardTail,
            )?;
        }
        tracing::debug!(%lane, %task_id, from = %old_position, to = %target, "reordered lane");
        Ok(target)
    }
}
