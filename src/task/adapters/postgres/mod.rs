//! `PostgreSQL` adapter for the task store.

mod models;
pub(crate) mod schema;
mod store;

pub use store::{PostgresTaskStore, TaskPgPool};
