//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist members and their denormalized `title`.
//! - Answer "who holds this title in this organization" lookups.
//!
//! # Invariants
//! - Members are never deleted through this repository.
//! - `claim_singleton_title` never overwrites a title another member of the
//!   same organization already holds.

use crate::model::governance::{Member, MemberId, OrganizationId};
use crate::model::title::Title;
use crate::repo::error::{Entity, RepoError, RepoResult};
use crate::repo::sql::{ensure_connection_ready, parse_enum, parse_uuid};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashSet;

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    organization_id,
    first_name,
    last_name,
    title
FROM members";

/// Repository interface for member records.
pub trait MemberRepository {
    fn create_member(&self, member: &Member) -> RepoResult<MemberId>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    /// Lists members with a non-null title, optionally scoped to one organization.
    fn list_titled_members(&self, organization: Option<OrganizationId>) -> RepoResult<Vec<Member>>;
    /// Returns members of `organization_id` currently holding `title`.
    fn find_title_holders(
        &self,
        organization_id: OrganizationId,
        title: Title,
    ) -> RepoResult<Vec<MemberId>>;
    /// Returns the subset of `ids` that exist in `organization_id`.
    fn existing_member_ids(
        &self,
        organization_id: OrganizationId,
        ids: &[MemberId],
    ) -> RepoResult<HashSet<MemberId>>;
    /// Sets or clears the title unconditionally.
    fn update_member_title(&self, id: MemberId, title: Option<Title>) -> RepoResult<()>;
    /// Sets `title` only when no other member of the organization holds it.
    ///
    /// Returns `false` when another holder exists; nothing is written then.
    fn claim_singleton_title(&self, id: MemberId, title: Title) -> RepoResult<bool>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn member_exists(&self, id: MemberId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM members WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn create_member(&self, member: &Member) -> RepoResult<MemberId> {
        self.conn.execute(
            "INSERT INTO members (
                id,
                organization_id,
                first_name,
                last_name,
                title
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                member.id.to_string(),
                member.organization_id.to_string(),
                member.first_name.as_str(),
                member.last_name.as_str(),
                member.title.map(Title::as_str),
            ],
        )?;
        Ok(member.id)
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn list_titled_members(&self, organization: Option<OrganizationId>) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL}
             WHERE title IS NOT NULL
               AND (?1 IS NULL OR organization_id = ?1)
             ORDER BY organization_id ASC, last_name ASC, first_name ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([organization.map(|id| id.to_string())])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn find_title_holders(
        &self,
        organization_id: OrganizationId,
        title: Title,
    ) -> RepoResult<Vec<MemberId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id
             FROM members
             WHERE organization_id = ?1
               AND title = ?2
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![organization_id.to_string(), title.as_str()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "members.id")?);
        }
        Ok(ids)
    }

    fn existing_member_ids(
        &self,
        organization_id: OrganizationId,
        ids: &[MemberId],
    ) -> RepoResult<HashSet<MemberId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM members WHERE organization_id = ? AND id IN ({placeholders});"
        );
        let mut bind_values = Vec::with_capacity(ids.len() + 1);
        bind_values.push(Value::Text(organization_id.to_string()));
        bind_values.extend(ids.iter().map(|id| Value::Text(id.to_string())));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut found = HashSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            found.insert(parse_uuid(&value, "members.id")?);
        }
        Ok(found)
    }

    fn update_member_title(&self, id: MemberId, title: Option<Title>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE members
             SET title = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), title.map(Title::as_str)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Member, id));
        }
        Ok(())
    }

    fn claim_singleton_title(&self, id: MemberId, title: Title) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE members
             SET title = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND NOT EXISTS (
                 SELECT 1
                 FROM members other
                 WHERE other.organization_id = members.organization_id
                   AND other.title = ?2
                   AND other.id <> ?1
               );",
            params![id.to_string(), title.as_str()],
        )?;
        if changed == 1 {
            return Ok(true);
        }
        if !self.member_exists(id)? {
            return Err(RepoError::not_found(Entity::Member, id));
        }
        Ok(false)
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let id_text: String = row.get("id")?;
    let organization_text: String = row.get("organization_id")?;
    let title = row
        .get::<_, Option<String>>("title")?
        .map(|value| parse_enum(&value, "members.title", Title::parse))
        .transpose()?;

    Ok(Member {
        id: parse_uuid(&id_text, "members.id")?,
        organization_id: parse_uuid(&organization_text, "members.organization_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        title,
    })
}
