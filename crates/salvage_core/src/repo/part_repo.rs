//! Part persistence.
//!
//! # Responsibility
//! - Store parts with their normalized attribute bag as a JSON document.
//! - Provide the store-side candidate filter used by search.
//!
//! # Invariants
//! - `props` is written once at creation; only `location_id` is mutable.
//! - Candidate listing is ordered by `id ASC` (creation order).

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::location::LocationId;
use crate::model::part::{Part, PartId, PropBag};
use rusqlite::{params, Connection, Row};

const PART_SELECT_SQL: &str = "SELECT
    id,
    type,
    name,
    props,
    location_id,
    created_at
FROM parts";

/// Repository interface for part storage.
pub trait PartRepository {
    /// Inserts one part; `props_json` must hold an already-normalized bag.
    fn create_part(
        &self,
        type_name: &str,
        name: &str,
        props_json: &str,
        location_id: Option<LocationId>,
    ) -> RepoResult<Part>;
    fn get_part(&self, id: PartId) -> RepoResult<Option<Part>>;
    /// Lists parts by exact type and name substring; empty filters match all.
    fn list_candidates(&self, type_name: &str, name: &str) -> RepoResult<Vec<Part>>;
    /// Assigns or clears the part location.
    fn set_location(&self, id: PartId, location_id: Option<LocationId>) -> RepoResult<()>;
}

/// SQLite-backed part repository.
pub struct SqlitePartRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePartRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "parts",
            &["id", "type", "name", "props", "location_id", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl PartRepository for SqlitePartRepository<'_> {
    fn create_part(
        &self,
        type_name: &str,
        name: &str,
        props_json: &str,
        location_id: Option<LocationId>,
    ) -> RepoResult<Part> {
        self.conn.execute(
            "INSERT INTO parts (type, name, props, location_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![type_name, name, props_json, location_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_part(id)?.ok_or(RepoError::NotFound { entity: "part", id })
    }

    fn get_part(&self, id: PartId) -> RepoResult<Option<Part>> {
        let sql = format!("{PART_SELECT_SQL} WHERE id = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_part_row(row)?));
        }
        Ok(None)
    }

    fn list_candidates(&self, type_name: &str, name: &str) -> RepoResult<Vec<Part>> {
        let sql = format!(
            "{PART_SELECT_SQL}
             WHERE (?1 = '' OR type = ?1)
               AND (?2 = '' OR name LIKE '%' || ?2 || '%')
             ORDER BY id ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![type_name, name])?;

        let mut parts = Vec::new();
        while let Some(row) = rows.next()? {
            parts.push(parse_part_row(row)?);
        }
        Ok(parts)
    }

    fn set_location(&self, id: PartId, location_id: Option<LocationId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parts SET location_id = ?2 WHERE id = ?1;",
            params![id, location_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "part", id });
        }
        Ok(())
    }
}

fn parse_part_row(row: &Row<'_>) -> RepoResult<Part> {
    let id: PartId = row.get("id")?;
    let props_text: String = row.get("props")?;
    let props: PropBag = serde_json::from_str(&props_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid props document for part {id}: {err}"))
    })?;

    Ok(Part {
        id,
        type_name: row.get("type")?,
        name: row.get("name")?,
        props,
        location_id: row.get("location_id")?,
        created_at: row.get("created_at")?,
    })
}

