//! Board, term and membership repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the normalized Board -> Term -> Membership graph.
//! - Own the transactional mutations: term activation, term deletion and
//!   full roster replacement.
//!
//! # Invariants
//! - One board per (organization, board type).
//! - Activating a term deactivates its siblings in the same transaction.
//! - Roster replacement deletes and inserts in one transaction; a failure
//!   leaves the previous roster in place.
//! - Membership listing is deterministic: `sort_order ASC, member_id ASC`.

use crate::db::is_unique_violation;
use crate::model::governance::{
    Board, BoardId, BoardMembership, BoardTerm, MemberId, MembershipId, NewTerm, OrganizationId,
    SeatRecord, TermId,
};
use crate::model::title::{BoardRole, BoardType, MemberType};
use crate::repo::error::{Entity, RepoError, RepoResult};
use crate::repo::sql::{bool_to_int, ensure_connection_ready, parse_enum, parse_flag, parse_uuid};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const TERM_SELECT_SQL: &str = "SELECT
    id,
    board_id,
    name,
    start_date,
    end_date,
    is_active
FROM board_terms";

const MEMBERSHIP_SELECT_SQL: &str = "SELECT
    id,
    member_id,
    term_id,
    role,
    member_type,
    sort_order
FROM board_memberships";

/// Repository interface for the board graph.
pub trait BoardRepository {
    /// Creates the board of `board_type` for an organization.
    ///
    /// Fails with `BoardAlreadyExists` when one is already present.
    fn create_board(
        &self,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> RepoResult<Board>;
    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    fn find_board(
        &self,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> RepoResult<Option<Board>>;

    /// Inserts a term; when `term.is_active`, siblings are deactivated first
    /// in the same transaction. An unset start date means "now".
    fn create_term(&self, board_id: BoardId, term: &NewTerm) -> RepoResult<BoardTerm>;
    fn get_term(&self, id: TermId) -> RepoResult<Option<BoardTerm>>;
    /// Lists all terms of a board, newest start date first.
    fn list_terms(&self, board_id: BoardId) -> RepoResult<Vec<BoardTerm>>;
    /// Lists terms flagged active, newest start date first.
    fn active_terms(&self, board_id: BoardId) -> RepoResult<Vec<BoardTerm>>;
    /// Activates `term_id` and deactivates every sibling atomically.
    fn activate_term(&self, term_id: TermId) -> RepoResult<()>;
    /// Deletes the term and its memberships atomically.
    ///
    /// Returns the number of membership rows removed.
    fn delete_term(&self, term_id: TermId) -> RepoResult<usize>;

    fn count_memberships(&self, term_id: TermId) -> RepoResult<usize>;
    fn list_memberships(&self, term_id: TermId) -> RepoResult<Vec<BoardMembership>>;
    fn find_membership(
        &self,
        member_id: MemberId,
        term_id: TermId,
    ) -> RepoResult<Option<BoardMembership>>;
    /// Returns `MAX(sort_order) + 1` for the term, or `0` when empty.
    fn next_membership_order(&self, term_id: TermId) -> RepoResult<i64>;
    fn insert_membership(&self, membership: &BoardMembership) -> RepoResult<()>;
    fn update_membership_seat(
        &self,
        id: MembershipId,
        role: BoardRole,
        member_type: MemberType,
    ) -> RepoResult<()>;
    /// Replaces every membership of the term with `memberships`.
    fn replace_memberships(
        &self,
        term_id: TermId,
        memberships: &[BoardMembership],
    ) -> RepoResult<()>;

    /// Lists every membership joined with its board and term flags,
    /// optionally scoped to one organization.
    fn list_seats(&self, organization: Option<OrganizationId>) -> RepoResult<Vec<SeatRecord>>;
}

/// SQLite-backed board graph repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(
        &self,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> RepoResult<Board> {
        let board = Board {
            id: Uuid::new_v4(),
            organization_id,
            board_type,
        };
        let inserted = self.conn.execute(
            "INSERT INTO boards (id, organization_id, board_type) VALUES (?1, ?2, ?3);",
            params![
                board.id.to_string(),
                organization_id.to_string(),
                board_type.as_str(),
            ],
        );
        match inserted {
            Ok(_) => Ok(board),
            Err(err) if is_unique_violation(&err) => Err(RepoError::BoardAlreadyExists {
                organization_id,
                board_type,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let board = self
            .conn
            .query_row(
                "SELECT id, organization_id, board_type FROM boards WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_board_row(row)),
            )
            .optional()?;
        board.transpose()
    }

    fn find_board(
        &self,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> RepoResult<Option<Board>> {
        let board = self
            .conn
            .query_row(
                "SELECT id, organization_id, board_type
                 FROM boards
                 WHERE organization_id = ?1
                   AND board_type = ?2;",
                params![organization_id.to_string(), board_type.as_str()],
                |row| Ok(parse_board_row(row)),
            )
            .optional()?;
        board.transpose()
    }

    fn create_term(&self, board_id: BoardId, term: &NewTerm) -> RepoResult<BoardTerm> {
        let term_id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if term.is_active {
            tx.execute(
                "UPDATE board_terms SET is_active = 0 WHERE board_id = ?1 AND is_active = 1;",
                [board_id.to_string()],
            )?;
        }
        tx.execute(
            "INSERT INTO board_terms (
                id,
                board_id,
                name,
                start_date,
                end_date,
                is_active
            ) VALUES (?1, ?2, ?3, COALESCE(?4, strftime('%s', 'now') * 1000), ?5, ?6);",
            params![
                term_id.to_string(),
                board_id.to_string(),
                term.name.as_deref(),
                term.start_date,
                term.end_date,
                bool_to_int(term.is_active),
            ],
        )?;
        let created = load_term(&tx, term_id)?.ok_or(RepoError::not_found(Entity::Term, term_id))?;
        tx.commit()?;
        Ok(created)
    }

    fn get_term(&self, id: TermId) -> RepoResult<Option<BoardTerm>> {
        load_term(self.conn, id)
    }

    fn list_terms(&self, board_id: BoardId) -> RepoResult<Vec<BoardTerm>> {
        query_terms(
            self.conn,
            &format!(
                "{TERM_SELECT_SQL}
                 WHERE board_id = ?1
                 ORDER BY start_date DESC, id ASC;"
            ),
            board_id,
        )
    }

    fn active_terms(&self, board_id: BoardId) -> RepoResult<Vec<BoardTerm>> {
        query_terms(
            self.conn,
            &format!(
                "{TERM_SELECT_SQL}
                 WHERE board_id = ?1
                   AND is_active = 1
                 ORDER BY start_date DESC, id ASC;"
            ),
            board_id,
        )
    }

    fn activate_term(&self, term_id: TermId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let board_id: Option<String> = tx
            .query_row(
                "SELECT board_id FROM board_terms WHERE id = ?1;",
                [term_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(board_id) = board_id else {
            return Err(RepoError::not_found(Entity::Term, term_id));
        };

        // Deactivate first: the partial unique index rejects two active rows.
        tx.execute(
            "UPDATE board_terms
             SET is_active = 0
             WHERE board_id = ?1
               AND id <> ?2
               AND is_active = 1;",
            params![board_id, term_id.to_string()],
        )?;
        tx.execute(
            "UPDATE board_terms SET is_active = 1 WHERE id = ?1;",
            [term_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_term(&self, term_id: TermId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            "DELETE FROM board_memberships WHERE term_id = ?1;",
            [term_id.to_string()],
        )?;
        let deleted = tx.execute(
            "DELETE FROM board_terms WHERE id = ?1;",
            [term_id.to_string()],
        )?;
        if deleted == 0 {
            return Err(RepoError::not_found(Entity::Term, term_id));
        }
        tx.commit()?;
        Ok(removed)
    }

    fn count_memberships(&self, term_id: TermId) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM board_memberships WHERE term_id = ?1;",
            [term_id.to_string()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative membership count {count}")))
    }

    fn list_memberships(&self, term_id: TermId) -> RepoResult<Vec<BoardMembership>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE term_id = ?1
             ORDER BY sort_order ASC, member_id ASC;"
        ))?;
        let mut rows = stmt.query([term_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_membership_row(row)?);
        }
        Ok(items)
    }

    fn find_membership(
        &self,
        member_id: MemberId,
        term_id: TermId,
    ) -> RepoResult<Option<BoardMembership>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE member_id = ?1
               AND term_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![member_id.to_string(), term_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_membership_row(row)?));
        }
        Ok(None)
    }

    fn next_membership_order(&self, term_id: TermId) -> RepoResult<i64> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM board_memberships
             WHERE term_id = ?1;",
            [term_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    fn insert_membership(&self, membership: &BoardMembership) -> RepoResult<()> {
        insert_membership_row(self.conn, membership)
    }

    fn update_membership_seat(
        &self,
        id: MembershipId,
        role: BoardRole,
        member_type: MemberType,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE board_memberships
             SET role = ?2,
                 member_type = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), role.as_str(), member_type.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Membership, id));
        }
        Ok(())
    }

    fn replace_memberships(
        &self,
        term_id: TermId,
        memberships: &[BoardMembership],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_term(&tx, term_id)?.is_none() {
            return Err(RepoError::not_found(Entity::Term, term_id));
        }

        tx.execute(
            "DELETE FROM board_memberships WHERE term_id = ?1;",
            [term_id.to_string()],
        )?;
        for membership in memberships {
            if membership.term_id != term_id {
                return Err(RepoError::InvalidData(format!(
                    "membership {} targets term {}, expected {term_id}",
                    membership.id, membership.term_id
                )));
            }
            insert_membership_row(&tx, membership)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_seats(&self, organization: Option<OrganizationId>) -> RepoResult<Vec<SeatRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.id AS id,
                m.member_id AS member_id,
                m.term_id AS term_id,
                m.role AS role,
                m.member_type AS member_type,
                m.sort_order AS sort_order,
                b.organization_id AS organization_id,
                b.board_type AS board_type,
                t.is_active AS is_active
             FROM board_memberships m
             INNER JOIN board_terms t ON t.id = m.term_id
             INNER JOIN boards b ON b.id = t.board_id
             WHERE (?1 IS NULL OR b.organization_id = ?1)
             ORDER BY b.organization_id ASC, m.member_id ASC, m.sort_order ASC, m.id ASC;",
        )?;
        let mut rows = stmt.query([organization.map(|id| id.to_string())])?;
        let mut seats = Vec::new();
        while let Some(row) = rows.next()? {
            let organization_text: String = row.get("organization_id")?;
            let board_type_text: String = row.get("board_type")?;
            seats.push(SeatRecord {
                membership: parse_membership_row(row)?,
                organization_id: parse_uuid(&organization_text, "boards.organization_id")?,
                board_type: parse_enum(&board_type_text, "boards.board_type", BoardType::parse)?,
                term_is_active: parse_flag(row.get("is_active")?, "board_terms.is_active")?,
            });
        }
        Ok(seats)
    }
}

fn insert_membership_row(conn: &Connection, membership: &BoardMembership) -> RepoResult<()> {
    let inserted = conn.execute(
        "INSERT INTO board_memberships (
            id,
            member_id,
            term_id,
            role,
            member_type,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            membership.id.to_string(),
            membership.member_id.to_string(),
            membership.term_id.to_string(),
            membership.role.as_str(),
            membership.member_type.as_str(),
            membership.order,
        ],
    );
    match inserted {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(RepoError::MembershipAlreadyExists {
            member_id: membership.member_id,
            term_id: membership.term_id,
        }),
        Err(err) => Err(err.into()),
    }
}

fn load_term(conn: &Connection, id: TermId) -> RepoResult<Option<BoardTerm>> {
    let mut stmt = conn.prepare(&format!("{TERM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_term_row(row)?));
    }
    Ok(None)
}

fn query_terms(conn: &Connection, sql: &str, board_id: BoardId) -> RepoResult<Vec<BoardTerm>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([board_id.to_string()])?;
    let mut terms = Vec::new();
    while let Some(row) = rows.next()? {
        terms.push(parse_term_row(row)?);
    }
    Ok(terms)
}

fn parse_board_row(row: &Row<'_>) -> RepoResult<Board> {
    let id_text: String = row.get("id")?;
    let organization_text: String = row.get("organization_id")?;
    let board_type_text: String = row.get("board_type")?;
    Ok(Board {
        id: parse_uuid(&id_text, "boards.id")?,
        organization_id: parse_uuid(&organization_text, "boards.organization_id")?,
        board_type: parse_enum(&board_type_text, "boards.board_type", BoardType::parse)?,
    })
}

fn parse_term_row(row: &Row<'_>) -> RepoResult<BoardTerm> {
    let id_text: String = row.get("id")?;
    let board_text: String = row.get("board_id")?;
    Ok(BoardTerm {
        id: parse_uuid(&id_text, "board_terms.id")?,
        board_id: parse_uuid(&board_text, "board_terms.board_id")?,
        name: row.get("name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        is_active: parse_flag(row.get("is_active")?, "board_terms.is_active")?,
    })
}

fn parse_membership_row(row: &Row<'_>) -> RepoResult<BoardMembership> {
    let id_text: String = row.get("id")?;
    let member_text: String = row.get("member_id")?;
    let term_text: String = row.get("term_id")?;
    let role_text: String = row.get("role")?;
    let member_type_text: String = row.get("member_type")?;
    Ok(BoardMembership {
        id: parse_uuid(&id_text, "board_memberships.id")?,
        member_id: parse_uuid(&member_text, "board_memberships.member_id")?,
        term_id: parse_uuid(&term_text, "board_memberships.term_id")?,
        role: parse_enum(&role_text, "board_memberships.role", BoardRole::parse)?,
        member_type: parse_enum(
            &member_type_text,
            "board_memberships.member_type",
            MemberType::parse,
        )?,
        order: row.get("sort_order")?,
    })
}
