//! Flux board: task-board backend core.
//!
//! This crate keeps task ordering within each board lane dense while tasks
//! are created, moved between lanes, reordered, and deleted, and records a
//! field-level audit trail for every committed mutation. Several callers may
//! mutate the same board concurrently.
//!
//! # Architecture
//!
//! Flux board follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`board`]: Boards, membership, and the board creation hook
//! - [`task`]: Lane allocation, change recording, mutation coordination, and
//!   statistics

pub mod board;
pub mod task;
