//! Shared fixtures for `PostgreSQL` integration tests.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use flux_board::board::{
    adapters::postgres::PostgresBoardRepository,
    domain::{Board, BoardId, BoardMember, BoardName, MemberRole, UserId},
    ports::BoardRepository,
};
use flux_board::task::{
    adapters::postgres::PostgresTaskStore, ports::TransactionSettings,
    services::TaskMutationService,
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use std::sync::Arc;
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service type wired to `PostgreSQL` adapters.
pub type PgService = TaskMutationService<PostgresTaskStore, PostgresBoardRepository, DefaultClock>;

/// SQL creating boards and membership.
const CREATE_BOARDS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_boards/up.sql");

/// SQL creating tasks and the audit log.
const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000001_create_tasks/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "flux_board_test_template";

/// Connections per test database; concurrency tests need more than one.
const POOL_SIZE: u32 = 6;

/// Creates a multi-threaded runtime so blocking pool work can overlap.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, CREATE_BOARDS_SQL)?;
            execute_sql_statements(&mut conn, CREATE_TASKS_SQL)?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Executes each `;`-separated statement of a migration file.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

/// Drops the test database when dropped, even if the test panics.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(&self.db_name) {
            tracing::warn!(db_name = %self.db_name, error = %err, "failed to drop test database");
        }
    }
}

/// A migrated database with both adapters and a service wired to it.
pub struct PgContext {
    pub runtime: Runtime,
    pub store: Arc<PostgresTaskStore>,
    pub boards: Arc<PostgresBoardRepository>,
    pub service: PgService,
    _guard: CleanupGuard,
}

impl PgContext {
    /// Creates a fresh database from the template.
    pub fn new(cluster: &'static TestCluster, settings: TransactionSettings) -> Self {
        ensure_template(cluster).expect("template setup");
        let db_name = format!("test_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(&db_name, TEMPLATE_DB)
            .expect("database creation");
        let guard = CleanupGuard {
            cluster,
            db_name: db_name.clone(),
        };

        let manager = ConnectionManager::<PgConnection>::new(cluster.connection().database_url(&db_name));
        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .build(manager)
            .expect("pool creation");
        let store = Arc::new(PostgresTaskStore::with_settings(pool.clone(), settings));
        let boards = Arc::new(PostgresBoardRepository::new(pool));
        let service = TaskMutationService::new(
            Arc::clone(&store),
            Arc::clone(&boards),
            Arc::new(DefaultClock),
        );
        Self {
            runtime: test_runtime(),
            store,
            boards,
            service,
            _guard: guard,
        }
    }

    /// Stores a board owned by `owner`, including the owner's membership.
    pub fn add_board(&self, owner: UserId) -> BoardId {
        let board = Board::new(
            BoardName::new("Integration board").expect("valid board name"),
            owner,
            &DefaultClock,
        );
        self.runtime
            .block_on(self.boards.store(&board))
            .expect("board should be stored");
        self.runtime
            .block_on(self.boards.add_member(&BoardMember::new(
                board.id(),
                owner,
                MemberRole::Owner,
                &DefaultClock,
            )))
            .expect("owner should be added");
        board.id()
    }
}
