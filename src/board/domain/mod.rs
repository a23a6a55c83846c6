//! Domain model for boards and board membership.

mod board;
mod error;
mod ids;

pub use board::{Board, BoardMember, BoardName, MemberRole, PersistedBoardData};
pub use error::{BoardDomainError, ParseMemberRoleError};
pub use ids::{BoardId, UserId};
