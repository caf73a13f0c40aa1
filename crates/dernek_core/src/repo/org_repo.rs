//! Organization repository contracts and SQLite implementation.

use crate::model::governance::{Organization, OrganizationId};
use crate::repo::error::{Entity, RepoError, RepoResult};
use crate::repo::sql::{ensure_connection_ready, parse_uuid};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for tenant records.
pub trait OrganizationRepository {
    fn create_organization(&self, organization: &Organization) -> RepoResult<OrganizationId>;
    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<Organization>>;
    /// Lists organizations ordered by name, then id.
    fn list_organizations(&self) -> RepoResult<Vec<Organization>>;
}

/// SQLite-backed organization repository.
pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl OrganizationRepository for SqliteOrganizationRepository<'_> {
    fn create_organization(&self, organization: &Organization) -> RepoResult<OrganizationId> {
        let name = organization.name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "organization name must not be blank".to_string(),
            ));
        }
        self.conn.execute(
            "INSERT INTO organizations (id, name) VALUES (?1, ?2);",
            params![organization.id.to_string(), name],
        )?;
        Ok(organization.id)
    }

    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<Organization>> {
        let organization = self
            .conn
            .query_row(
                "SELECT id, name FROM organizations WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_organization_row(row)),
            )
            .optional()?;
        organization.transpose()
    }

    fn list_organizations(&self) -> RepoResult<Vec<Organization>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM organizations ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_organization_row(row)?);
        }
        Ok(items)
    }
}

/// Fails with `NotFound` when the organization does not exist.
pub fn require_organization(
    repo: &impl OrganizationRepository,
    id: OrganizationId,
) -> RepoResult<Organization> {
    repo.get_organization(id)?
        .ok_or(RepoError::not_found(Entity::Organization, id))
}

fn parse_organization_row(row: &Row<'_>) -> RepoResult<Organization> {
    let id_text: String = row.get("id")?;
    Ok(Organization {
        id: parse_uuid(&id_text, "organizations.id")?,
        name: row.get("name")?,
    })
}
