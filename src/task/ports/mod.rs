//! Port contracts for the task mutation pipeline.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod store;

pub use store::{
    LaneTransaction, TaskStore, TaskStoreError, TaskStoreResult, TransactionSettings,
};
