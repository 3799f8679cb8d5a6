//! Location persistence.
//!
//! # Responsibility
//! - Store the container forest as `(id, parent_id)` rows.
//! - Answer the direct-child and direct-part counts the hierarchy rules need.
//!
//! # Invariants
//! - Child listing is deterministic: `name ASC, id ASC`.
//! - No recursive SQL; path and subtree walks happen in the service layer.

use super::{count_from_db, ensure_connection_ready, RepoError, RepoResult};
use crate::model::location::{Location, LocationId, LocationType};
use rusqlite::{params, Connection, Row};

const LOCATION_SELECT_SQL: &str = "SELECT
    id,
    name,
    parent_id,
    loc_type,
    description,
    created_at
FROM locations";

/// Repository interface for location hierarchy storage.
pub trait LocationRepository {
    fn create_location(
        &self,
        name: &str,
        parent_id: Option<LocationId>,
        kind: LocationType,
        description: &str,
    ) -> RepoResult<Location>;
    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>>;
    /// Case-insensitive name lookup; the oldest match wins.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Location>>;
    /// Lists direct children, or roots when `parent_id` is `None`.
    fn list_children(&self, parent_id: Option<LocationId>) -> RepoResult<Vec<Location>>;
    fn set_parent(&self, id: LocationId, parent_id: Option<LocationId>) -> RepoResult<()>;
    fn delete_location(&self, id: LocationId) -> RepoResult<()>;
    fn count_children(&self, id: LocationId) -> RepoResult<u64>;
    /// Counts parts assigned directly to `id`.
    fn count_direct_parts(&self, id: LocationId) -> RepoResult<u64>;
}

/// SQLite-backed location repository.
pub struct SqliteLocationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "locations",
            &[
                "id",
                "name",
                "parent_id",
                "loc_type",
                "description",
                "created_at",
            ],
        )?;
        Ok(Self { conn })
    }

    fn query_locations(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Location>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_location_row(row)?);
        }
        Ok(items)
    }
}

impl LocationRepository for SqliteLocationRepository<'_> {
    fn create_location(
        &self,
        name: &str,
        parent_id: Option<LocationId>,
        kind: LocationType,
        description: &str,
    ) -> RepoResult<Location> {
        self.conn.execute(
            "INSERT INTO locations (name, parent_id, loc_type, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![name, parent_id, kind.as_str(), description],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_location(id)?.ok_or(RepoError::NotFound {
            entity: "location",
            id,
        })
    }

    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>> {
        let sql = format!("{LOCATION_SELECT_SQL} WHERE id = ?1;");
        Ok(self.query_locations(&sql, [id])?.into_iter().next())
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Location>> {
        let sql = format!(
            "{LOCATION_SELECT_SQL}
             WHERE name = ?1 COLLATE NOCASE
             ORDER BY id ASC
             LIMIT 1;"
        );
        Ok(self.query_locations(&sql, [name])?.into_iter().next())
    }

    fn list_children(&self, parent_id: Option<LocationId>) -> RepoResult<Vec<Location>> {
        match parent_id {
            Some(parent_id) => {
                let sql = format!(
                    "{LOCATION_SELECT_SQL}
                     WHERE parent_id = ?1
                     ORDER BY name ASC, id ASC;"
                );
                self.query_locations(&sql, [parent_id])
            }
            None => {
                let sql = format!(
                    "{LOCATION_SELECT_SQL}
                     WHERE parent_id IS NULL
                     ORDER BY name ASC, id ASC;"
                );
                self.query_locations(&sql, params![])
            }
        }
    }

    fn set_parent(&self, id: LocationId, parent_id: Option<LocationId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE locations SET parent_id = ?2 WHERE id = ?1;",
            params![id, parent_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "location",
                id,
            });
        }
        Ok(())
    }

    fn delete_location(&self, id: LocationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM locations WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "location",
                id,
            });
        }
        Ok(())
    }

    fn count_children(&self, id: LocationId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM locations WHERE parent_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        count_from_db(count, "locations.parent_id")
    }

    fn count_direct_parts(&self, id: LocationId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM parts WHERE location_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        count_from_db(count, "parts.location_id")
    }
}

fn parse_location_row(row: &Row<'_>) -> RepoResult<Location> {
    let kind_text: String = row.get("loc_type")?;
    let kind = LocationType::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid location type `{kind_text}` in locations.loc_type"
        ))
    })?;

    Ok(Location {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
        kind,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}
