//! Repository error taxonomy shared by all governance repositories.

use crate::db::DbError;
use crate::model::governance::{MemberId, OrganizationId, TermId};
use crate::model::title::BoardType;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kind named by `RepoError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Organization,
    Member,
    Board,
    Term,
    Membership,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Member => "member",
            Self::Board => "board",
            Self::Term => "term",
            Self::Membership => "membership",
        }
    }
}

#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist.
    NotFound { entity: Entity, id: Uuid },
    /// Organization already has a board of this type.
    BoardAlreadyExists {
        organization_id: OrganizationId,
        board_type: BoardType,
    },
    /// Member already has a seat on this term.
    MembershipAlreadyExists { member_id: MemberId, term_id: TermId },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{} not found: {id}", entity.as_str()),
            Self::BoardAlreadyExists {
                organization_id,
                board_type,
            } => write!(
                f,
                "organization {organization_id} already has a {board_type} board"
            ),
            Self::MembershipAlreadyExists { member_id, term_id } => {
                write!(f, "member {member_id} already has a seat on term {term_id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "governance repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "governance repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted governance data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
