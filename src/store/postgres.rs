//! Networked relational backend on PostgreSQL.
//!
//! Row-level atomicity comes from the database: `delete` and `describe`
//! lock the row with `SELECT ... FOR UPDATE` inside a transaction before
//! bumping it.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::{OpContext, SecretStore};
use crate::errors::{KeepSyncError, Result};
use crate::vault::{next_version, Digest, Secret, SecretId, SecretKind, Version};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS secrets (
        id          UUID PRIMARY KEY,
        owner_id    TEXT NOT NULL,
        payload     BYTEA NOT NULL,
        kind        TEXT NOT NULL,
        description TEXT NOT NULL,
        deleted     BOOLEAN NOT NULL DEFAULT FALSE,
        version     TIMESTAMPTZ NOT NULL
    )";

const OWNER_INDEX: &str = "CREATE INDEX IF NOT EXISTS secrets_owner ON secrets (owner_id)";

fn db_err(op: &'static str) -> impl Fn(sqlx::Error) -> KeepSyncError {
    move |e| KeepSyncError::Storage(format!("postgres {op}: {e}"))
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `url` and make sure the table exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(db_err("connect"))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(db_err("create schema"))?;
        sqlx::query(OWNER_INDEX)
            .execute(&pool)
            .await
            .map_err(db_err("create index"))?;

        Ok(Self { pool })
    }

    fn secret_from_row(row: &PgRow) -> Result<Secret> {
        let kind: String = row.try_get("kind").map_err(db_err("read kind"))?;
        Ok(Secret {
            id: row.try_get("id").map_err(db_err("read id"))?,
            owner_id: row.try_get("owner_id").map_err(db_err("read owner"))?,
            payload: row.try_get("payload").map_err(db_err("read payload"))?,
            kind: kind.parse::<SecretKind>()?,
            description: row
                .try_get("description")
                .map_err(db_err("read description"))?,
            deleted: row.try_get("deleted").map_err(db_err("read deleted"))?,
            version: row.try_get("version").map_err(db_err("read version"))?,
        })
    }
}

#[async_trait]
impl SecretStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err("ping"))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    async fn put(&self, ctx: &OpContext, secret: Secret) -> Result<()> {
        ctx.run(async {
            sqlx::query(
                "INSERT INTO secrets (id, owner_id, payload, kind, description, deleted, version)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (id) DO UPDATE SET
                    owner_id    = EXCLUDED.owner_id,
                    payload     = EXCLUDED.payload,
                    kind        = EXCLUDED.kind,
                    description = EXCLUDED.description,
                    deleted     = EXCLUDED.deleted,
                    version     = EXCLUDED.version",
            )
            .bind(secret.id)
            .bind(&secret.owner_id)
            .bind(&secret.payload)
            .bind(secret.kind.as_str())
            .bind(&secret.description)
            .bind(secret.deleted)
            .bind(secret.version)
            .execute(&self.pool)
            .await
            .map_err(db_err("put"))?;
            Ok(())
        })
        .await
    }

    async fn get(&self, ctx: &OpContext, id: SecretId) -> Result<Secret> {
        ctx.run(async {
            let row = sqlx::query(
                "SELECT id, owner_id, payload, kind, description, deleted, version
                 FROM secrets WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("get"))?
            .ok_or(KeepSyncError::NotFound(id))?;
            Self::secret_from_row(&row)
        })
        .await
    }

    async fn delete(&self, ctx: &OpContext, id: SecretId) -> Result<()> {
        ctx.run(async {
            let mut tx = self.pool.begin().await.map_err(db_err("delete begin"))?;

            let current: Option<Version> = sqlx::query_scalar(
                "SELECT version FROM secrets WHERE id = $1 AND deleted = FALSE FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err("delete lookup"))?;

            let current = current.ok_or(KeepSyncError::NotFound(id))?;

            sqlx::query("UPDATE secrets SET deleted = TRUE, version = $1 WHERE id = $2")
                .bind(next_version(current))
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err("delete update"))?;

            tx.commit().await.map_err(db_err("delete commit"))
        })
        .await
    }

    async fn describe(&self, ctx: &OpContext, id: SecretId, description: &str) -> Result<()> {
        ctx.run(async {
            let mut tx = self.pool.begin().await.map_err(db_err("describe begin"))?;

            let current: Option<Version> = sqlx::query_scalar(
                "SELECT version FROM secrets WHERE id = $1 AND deleted = FALSE FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err("describe lookup"))?;

            let current = current.ok_or(KeepSyncError::NotFound(id))?;

            sqlx::query("UPDATE secrets SET description = $1, version = $2 WHERE id = $3")
                .bind(description)
                .bind(next_version(current))
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err("describe update"))?;

            tx.commit().await.map_err(db_err("describe commit"))
        })
        .await
    }

    async fn digests_for(&self, ctx: &OpContext, owner_id: &str) -> Result<Vec<Digest>> {
        ctx.run(async {
            let rows = sqlx::query(
                "SELECT id, payload, description, deleted, version
                 FROM secrets WHERE owner_id = $1 ORDER BY id",
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("digests"))?;

            rows.iter()
                .map(|row| {
                    let payload: Vec<u8> = row.try_get("payload").map_err(db_err("read payload"))?;
                    let description: String = row
                        .try_get("description")
                        .map_err(db_err("read description"))?;
                    Ok(Digest::from_parts(
                        row.try_get("id").map_err(db_err("read id"))?,
                        &payload,
                        &description,
                        row.try_get("deleted").map_err(db_err("read deleted"))?,
                        row.try_get("version").map_err(db_err("read version"))?,
                    ))
                })
                .collect()
        })
        .await
    }
}
