//! Per-lane exclusive locks for the in-memory store.

use crate::task::domain::{LaneKey, LaneSet};
use crate::task::ports::{TaskStoreError, TaskStoreResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Purge dead entries every this many acquisitions.
const CLEANUP_INTERVAL: usize = 64;

/// Entry count below which cleanup is skipped.
const CLEANUP_THRESHOLD: usize = 128;

/// Lock map keyed by lane.
///
/// Disjoint lanes never contend. Entries are held weakly so lanes nobody is
/// mutating do not accumulate.
#[derive(Debug, Default)]
pub(super) struct LaneLocks {
    locks: StdMutex<HashMap<LaneKey, Weak<Mutex<()>>>>,
    acquisitions: AtomicUsize,
}

/// Guards for every lane of one atomic unit, released on drop.
#[derive(Debug)]
pub(super) struct LaneGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LaneLocks {
    /// Acquires every lane of `lanes` in ascending order.
    ///
    /// Fails with [`TaskStoreError::Conflict`] when the locks are not all
    /// held within `timeout`; locks taken so far are released.
    pub(super) async fn acquire(
        &self,
        lanes: &LaneSet,
        timeout: Duration,
    ) -> TaskStoreResult<LaneGuards> {
        let mutexes: Vec<Arc<Mutex<()>>> =
            lanes.iter().map(|lane| self.mutex_for(lane)).collect();
        let acquire_all = async move {
            let mut guards = Vec::with_capacity(mutexes.len());
            for mutex in mutexes {
                guards.push(mutex.lock_owned().await);
            }
            guards
        };

        match tokio::time::timeout(timeout, acquire_all).await {
            Ok(guards) => Ok(LaneGuards { _guards: guards }),
            Err(_) => {
                tracing::warn!(lanes = %lanes, ?timeout, "timed out waiting for lane locks");
                Err(TaskStoreError::conflict(format!(
                    "timed out after {}ms waiting for lanes {lanes}",
                    timeout.as_millis()
                )))
            }
        }
    }

    fn mutex_for(&self, lane: LaneKey) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let mutex = map.get(&lane).and_then(Weak::upgrade).unwrap_or_else(|| {
            let fresh = Arc::new(Mutex::new(()));
            map.insert(lane, Arc::downgrade(&fresh));
            fresh
        });

        let tick = self.acquisitions.fetch_add(1, Ordering::Relaxed);
        if map.len() > CLEANUP_THRESHOLD && tick.is_multiple_of(CLEANUP_INTERVAL) {
            map.retain(|_, weak| weak.strong_count() > 0);
        }
        mutex
    }
}
