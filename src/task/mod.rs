//! Task mutation pipeline.
//!
//! Tasks live in lanes keyed by `(board, status)` and hold dense positions
//! `0..n` within their lane. Every create, update, delete and reorder runs
//! as a single atomic unit that keeps its lanes dense and appends a
//! field-level audit trail. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
