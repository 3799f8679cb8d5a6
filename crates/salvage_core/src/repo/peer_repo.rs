//! Federation peer persistence.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::peer::Peer;
use rusqlite::{params, Connection, ErrorCode, Row};

const PEER_SELECT_SQL: &str = "SELECT id, name, url, api_key FROM peers";

/// Repository interface for known peers.
pub trait PeerRepository {
    /// Registers one peer; names are unique.
    fn add_peer(&self, name: &str, url: &str, api_key: &str) -> RepoResult<Peer>;
    /// Lists peers ordered by name.
    fn list_peers(&self) -> RepoResult<Vec<Peer>>;
    fn get_peer(&self, name: &str) -> RepoResult<Option<Peer>>;
}

/// SQLite-backed peer repository.
pub struct SqlitePeerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePeerRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "peers", &["id", "name", "url", "api_key"])?;
        Ok(Self { conn })
    }
}

impl PeerRepository for SqlitePeerRepository<'_> {
    fn add_peer(&self, name: &str, url: &str, api_key: &str) -> RepoResult<Peer> {
        let inserted = self.conn.execute(
            "INSERT INTO peers (name, url, api_key) VALUES (?1, ?2, ?3);",
            params![name, url.trim_end_matches('/'), api_key],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(RepoError::DuplicateName {
                    entity: "peer",
                    name: name.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.get_peer(name)?
            .ok_or(RepoError::NotFound { entity: "peer", id })
    }

    fn list_peers(&self) -> RepoResult<Vec<Peer>> {
        let sql = format!("{PEER_SELECT_SQL} ORDER BY name ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut peers = Vec::new();
        while let Some(row) = rows.next()? {
            peers.push(parse_peer_row(row)?);
        }
        Ok(peers)
    }

    fn get_peer(&self, name: &str) -> RepoResult<Option<Peer>> {
        let sql = format!("{PEER_SELECT_SQL} WHERE name = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_peer_row(row)?));
        }
        Ok(None)
    }
}

fn parse_peer_row(row: &Row<'_>) -> RepoResult<Peer> {
    Ok(Peer {
        id: row.get("id")?,
        name: row.get("name")?,
        url: row.get("url")?,
        api_key: row.get("api_key")?,
    })
}
