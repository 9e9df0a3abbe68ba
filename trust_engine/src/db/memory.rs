use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    credentials::TenantCredentials,
    db::{CredentialStore, CredentialStoreError},
};

/// In-memory credential store for tests and development.
///
/// Clones share the same underlying map, so the store can be handed to every worker and API
/// object the same way the SQLite store is.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<String, TenantCredentials>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn store(&self, credentials: TenantCredentials) -> Result<(), CredentialStoreError> {
        let mut lock = self
            .credentials
            .write()
            .map_err(|e| CredentialStoreError::DatabaseError(format!("credential map poisoned: {e}")))?;
        lock.insert(credentials.tenant_id.clone(), credentials);
        Ok(())
    }

    async fn get(&self, tenant_id: &str) -> Result<TenantCredentials, CredentialStoreError> {
        let lock = self
            .credentials
            .read()
            .map_err(|e| CredentialStoreError::DatabaseError(format!("credential map poisoned: {e}")))?;
        lock.get(tenant_id).cloned().ok_or(CredentialStoreError::NotFound)
    }

    async fn delete(&self, tenant_id: &str) -> Result<(), CredentialStoreError> {
        let mut lock = self
            .credentials
            .write()
            .map_err(|e| CredentialStoreError::DatabaseError(format!("credential map poisoned: {e}")))?;
        match lock.remove(tenant_id) {
            Some(_) => Ok(()),
            None => Err(CredentialStoreError::NotFound),
        }
    }
}
