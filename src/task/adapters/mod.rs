//! Storage adapters for the task pipeline.
//!
//! - [`memory::InMemoryTaskStore`]: lane-locked in-memory storage for tests
//! - [`postgres::PostgresTaskStore`]: `PostgreSQL` persistence using Diesel

pub mod memory;
pub mod postgres;
