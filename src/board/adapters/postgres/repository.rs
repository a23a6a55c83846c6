//! `PostgreSQL` repository implementation for boards and membership.

use super::{
    models::{BoardRow, NewBoardMemberRow, NewBoardRow},
    schema::{board_members, boards},
};
use crate::board::{
    domain::{Board, BoardId, BoardMember, BoardName, PersistedBoardData, UserId},
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed board repository.
#[derive(Debug, Clone)]
pub struct PostgresBoardRepository {
    pool: BoardPgPool,
}

impl PostgresBoardRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BoardRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BoardRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BoardRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BoardRepositoryError::persistence)?
    }
}

#[async_trait]
impl BoardRepository for PostgresBoardRepository {
    async fn store(&self, board: &Board) -> BoardRepositoryResult<()> {
        let board_id = board.id();
        let new_row = NewBoardRow {
            id: board_id.into_inner(),
            name: board.name().as_str().to_owned(),
            description: board.description().map(str::to_owned),
            owner_id: board.owner().into_inner(),
            created_at: board.created_at(),
            updated_at: board.updated_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(boards::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateBoard(board_id)
                    }
                    _ => BoardRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: BoardId) -> BoardRepositoryResult<Option<Board>> {
        self.run_blocking(move |connection| {
            let row = boards::table
                .filter(boards::id.eq(id.into_inner()))
                .select(BoardRow::as_select())
                .first::<BoardRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            row.map(row_to_board).transpose()
        })
        .await
    }

    async fn exists(&self, id: BoardId) -> BoardRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let count: i64 = boards::table
                .filter(boards::id.eq(id.into_inner()))
                .count()
                .get_result(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(count > 0)
        })
        .await
    }

    async fn add_member(&self, member: &BoardMember) -> BoardRepositoryResult<()> {
        let board_id = member.board_id;
        let user_id = member.user_id;
        let new_row = NewBoardMemberRow {
            board_id: board_id.into_inner(),
            user_id: user_id.into_inner(),
            role: member.role.as_str().to_owned(),
            joined_at: member.joined_at,
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(board_members::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateMember { board_id, user_id }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        BoardRepositoryError::NotFound(board_id)
                    }
                    _ => BoardRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn is_member(&self, board_id: BoardId, user_id: UserId) -> BoardRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let count: i64 = board_members::table
                .filter(board_members::board_id.eq(board_id.into_inner()))
                .filter(board_members::user_id.eq(user_id.into_inner()))
                .count()
                .get_result(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(count > 0)
        })
        .await
    }

    async fn boards_for_member(&self, user_id: UserId) -> BoardRepositoryResult<Vec<BoardId>> {
        self.run_blocking(move |connection| {
            let ids = board_members::table
                .filter(board_members::user_id.eq(user_id.into_inner()))
                .order(board_members::board_id.asc())
                .select(board_members::board_id)
                .load::<uuid::Uuid>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(ids.into_iter().map(BoardId::from_uuid).collect())
        })
        .await
    }
}

fn row_to_board(row: BoardRow) -> BoardRepositoryResult<Board> {
    let BoardRow {
        id,
        name,
        description,
        owner_id,
        created_at,
        updated_at,
    } = row;

    let name = BoardName::new(name).map_err(BoardRepositoryError::persistence)?;
    Ok(Board::from_persisted(PersistedBoardData {
        id: BoardId::from_uuid(id),
        name,
        description,
        owner: UserId::from_uuid(owner_id),
        created_at,
        updated_at,
    }))
}
