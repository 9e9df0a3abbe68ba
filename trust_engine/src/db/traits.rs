use thiserror::Error;

use crate::credentials::TenantCredentials;

#[derive(Debug, Clone, Error)]
pub enum CredentialStoreError {
    #[error("credentials for tenant not found")]
    NotFound,
    #[error("database error: {0}")]
    DatabaseError(String),
    #[error("could not serialize credentials: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for CredentialStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Storage contract for per-tenant credential records.
///
/// Implementations must be safe to call from many in-flight request handlers at once: readers
/// and writers interleave freely, and a write for one tenant never blocks or corrupts reads for
/// another beyond the duration of the store's own lock.
#[allow(async_fn_in_trait)]
pub trait CredentialStore: Clone + Send + Sync + 'static {
    /// Insert or replace the record for `credentials.tenant_id`.
    async fn store(&self, credentials: TenantCredentials) -> Result<(), CredentialStoreError>;

    /// Fetch the record for `tenant_id`, or [`CredentialStoreError::NotFound`].
    async fn get(&self, tenant_id: &str) -> Result<TenantCredentials, CredentialStoreError>;

    /// Remove the record for `tenant_id`. Deleting an unknown tenant is an error, not a no-op.
    async fn delete(&self, tenant_id: &str) -> Result<(), CredentialStoreError>;
}
