//! Board and membership collaborator for the task pipeline.
//!
//! Boards scope task lanes. The task core only reads board identity,
//! existence and membership; board lifecycle lives here so the owner
//! membership rule stays outside the mutation pipeline. The module follows
//! the same hexagonal split as [`crate::task`]:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
