//! `PostgreSQL` adapters for board persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::{BoardPgPool, PostgresBoardRepository};
