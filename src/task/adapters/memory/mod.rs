//! In-memory task store for tests and embedded use.

mod lane_locks;
mod store;

pub use store::InMemoryTaskStore;
