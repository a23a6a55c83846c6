//! Port contracts for boards and membership.

pub mod hooks;
pub mod repository;

pub use hooks::BoardCreationHook;
pub use repository::{BoardRepository, BoardRepositoryError, BoardRepositoryResult};
