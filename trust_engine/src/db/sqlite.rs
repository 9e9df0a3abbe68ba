//! SQLite-backed credential store.
//!
//! The store keeps one row per tenant in a single `tenant_credentials` table: the tenant id is
//! the primary key and the value is the JSON-encoded [`TenantCredentials`] record. Queries go
//! through a connection pool, so concurrent request handlers interleave freely.

use std::{fmt, fmt::Debug, str::FromStr};

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row,
    SqlitePool,
};

use crate::{
    credentials::TenantCredentials,
    db::{CredentialStore, CredentialStoreError},
};

#[derive(Clone)]
pub struct SqliteCredentialStore {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SqliteCredentialStore ({:?})", self.pool)
    }
}

impl SqliteCredentialStore {
    /// Open (creating if necessary) the database at `url` and make sure the credentials table
    /// exists.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, CredentialStoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| CredentialStoreError::DatabaseError(e.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS tenant_credentials (
                tenant_id TEXT PRIMARY KEY NOT NULL,
                record    TEXT NOT NULL
            )"#,
        )
        .execute(&pool)
        .await?;
        debug!("🗝️ Credential store ready at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn store(&self, credentials: TenantCredentials) -> Result<(), CredentialStoreError> {
        let record = serde_json::to_string(&credentials)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        sqlx::query(
            r#"INSERT INTO tenant_credentials (tenant_id, record) VALUES ($1, $2)
               ON CONFLICT (tenant_id) DO UPDATE SET record = excluded.record"#,
        )
        .bind(&credentials.tenant_id)
        .bind(&record)
        .execute(&self.pool)
        .await?;
        trace!("🗝️ Stored credentials for tenant {}", credentials.tenant_id);
        Ok(())
    }

    async fn get(&self, tenant_id: &str) -> Result<TenantCredentials, CredentialStoreError> {
        let row = sqlx::query("SELECT record FROM tenant_credentials WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CredentialStoreError::NotFound)?;
        let record: String = row.get(0);
        serde_json::from_str(&record).map_err(|e| CredentialStoreError::Serialization(e.to_string()))
    }

    async fn delete(&self, tenant_id: &str) -> Result<(), CredentialStoreError> {
        let result = sqlx::query("DELETE FROM tenant_credentials WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CredentialStoreError::NotFound);
        }
        trace!("🗝️ Deleted credentials for tenant {tenant_id}");
        Ok(())
    }
}
