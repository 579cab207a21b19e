//! Embedded file-backed backend on SQLite.
//!
//! One connection behind a mutex. Calls are short and run inline on the
//! calling task; the mutex also gives per-id read-modify-write atomicity
//! for `delete` and `describe`.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{OpContext, SecretStore};
use crate::errors::{KeepSyncError, Result};
use crate::vault::{next_version, Digest, Secret, SecretId, SecretKind, Version};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS secrets (
        id          TEXT PRIMARY KEY,
        owner_id    TEXT NOT NULL,
        payload     BLOB NOT NULL,
        kind        TEXT NOT NULL,
        description TEXT NOT NULL,
        deleted     INTEGER NOT NULL DEFAULT 0,
        version     TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS secrets_owner ON secrets (owner_id);";

pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| KeepSyncError::Storage(format!("open {}: {e}", path.display())))?;

        // Owner-only: the file holds ciphertext plus plaintext descriptions.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        Self::with_connection(conn)
    }

    /// A private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| KeepSyncError::Storage(format!("open in-memory: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| KeepSyncError::Storage(format!("create schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Run `f` against the open connection.
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock();
        let conn = guard
            .as_mut()
            .ok_or_else(|| KeepSyncError::Storage("store is closed".into()))?;
        f(conn)
    }
}

#[async_trait]
impl SecretStore for SqliteStore {
    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| KeepSyncError::Storage(format!("ping: {e}")))
        })
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().take();
        if let Some(conn) = conn {
            conn.close()
                .map_err(|(_, e)| KeepSyncError::Storage(format!("close: {e}")))?;
        }
        Ok(())
    }

    async fn put(&self, ctx: &OpContext, secret: Secret) -> Result<()> {
        ctx.check()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO secrets (id, owner_id, payload, kind, description, deleted, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (id) DO UPDATE SET
                    owner_id    = excluded.owner_id,
                    payload     = excluded.payload,
                    kind        = excluded.kind,
                    description = excluded.description,
                    deleted     = excluded.deleted,
                    version     = excluded.version",
                params![
                    secret.id.to_string(),
                    secret.owner_id,
                    secret.payload,
                    secret.kind.as_str(),
                    secret.description,
                    secret.deleted,
                    format_version(&secret.version),
                ],
            )
            .map_err(|e| KeepSyncError::Storage(format!("put: {e}")))?;
            Ok(())
        })
    }

    async fn get(&self, ctx: &OpContext, id: SecretId) -> Result<Secret> {
        ctx.check()?;
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT owner_id, payload, kind, description, deleted, version
                 FROM secrets WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, bool>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| KeepSyncError::Storage(format!("get: {e}")))
        })?;

        let (owner_id, payload, kind, description, deleted, version) =
            row.ok_or(KeepSyncError::NotFound(id))?;

        Ok(Secret {
            id,
            owner_id,
            payload,
            kind: kind.parse::<SecretKind>()?,
            description,
            deleted,
            version: parse_version(&version)?,
        })
    }

    async fn delete(&self, ctx: &OpContext, id: SecretId) -> Result<()> {
        ctx.check()?;
        self.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| KeepSyncError::Storage(format!("delete begin: {e}")))?;

            let current: Option<String> = tx
                .query_row(
                    "SELECT version FROM secrets WHERE id = ?1 AND deleted = 0",
                    params![id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| KeepSyncError::Storage(format!("delete lookup: {e}")))?;

            let current = current.ok_or(KeepSyncError::NotFound(id))?;
            let bumped = next_version(parse_version(&current)?);

            tx.execute(
                "UPDATE secrets SET deleted = 1, version = ?1 WHERE id = ?2",
                params![format_version(&bumped), id.to_string()],
            )
            .map_err(|e| KeepSyncError::Storage(format!("delete update: {e}")))?;

            tx.commit()
                .map_err(|e| KeepSyncError::Storage(format!("delete commit: {e}")))
        })
    }

    async fn describe(&self, ctx: &OpContext, id: SecretId, description: &str) -> Result<()> {
        ctx.check()?;
        self.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| KeepSyncError::Storage(format!("describe begin: {e}")))?;

            let current: Option<String> = tx
                .query_row(
                    "SELECT version FROM secrets WHERE id = ?1 AND deleted = 0",
                    params![id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| KeepSyncError::Storage(format!("describe lookup: {e}")))?;

            let current = current.ok_or(KeepSyncError::NotFound(id))?;
            let bumped = next_version(parse_version(&current)?);

            tx.execute(
                "UPDATE secrets SET description = ?1, version = ?2 WHERE id = ?3",
                params![description, format_version(&bumped), id.to_string()],
            )
            .map_err(|e| KeepSyncError::Storage(format!("describe update: {e}")))?;

            tx.commit()
                .map_err(|e| KeepSyncError::Storage(format!("describe commit: {e}")))
        })
    }

    async fn digests_for(&self, ctx: &OpContext, owner_id: &str) -> Result<Vec<Digest>> {
        ctx.check()?;
        let rows = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, payload, description, deleted, version
                     FROM secrets WHERE owner_id = ?1 ORDER BY id",
                )
                .map_err(|e| KeepSyncError::Storage(format!("digests prepare: {e}")))?;

            let rows = stmt
                .query_map(params![owner_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(|e| KeepSyncError::Storage(format!("digests query: {e}")))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| KeepSyncError::Storage(format!("digests row: {e}")))?);
            }
            Ok(out)
        })?;

        rows.into_iter()
            .map(|(id, payload, description, deleted, version)| {
                let id = Uuid::parse_str(&id)
                    .map_err(|e| KeepSyncError::Decode(format!("stored id '{id}': {e}")))?;
                Ok(Digest::from_parts(
                    id,
                    &payload,
                    &description,
                    deleted,
                    parse_version(&version)?,
                ))
            })
            .collect()
    }
}

/// RFC 3339 at microsecond precision, the resolution versions carry.
fn format_version(version: &Version) -> String {
    version.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_version(raw: &str) -> Result<Version> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KeepSyncError::Decode(format!("stored version '{raw}': {e}")))
}
