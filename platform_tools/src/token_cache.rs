use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An OAuth2 access token for one tenant, valid until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Process-wide cache of OAuth2 access tokens, keyed by tenant id.
///
/// One instance is shared by every [`PlatformApi`](crate::PlatformApi) so that a cache hit
/// short-circuits the token exchange entirely. Tokens live for the process lifetime at most;
/// there is no eviction beyond overwrite-on-refresh, and an expired entry simply reads as a
/// miss until the next `put` replaces it.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<String, AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token for `tenant_id`, or `None` on a miss or an expired entry.
    ///
    /// The map holds no invariant a panicking writer could break, so a poisoned lock is
    /// recovered rather than treated as a dead cache.
    pub fn get(&self, tenant_id: &str) -> Option<AccessToken> {
        let lock = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        lock.get(tenant_id).filter(|t| !t.is_expired()).cloned()
    }

    pub fn put(&self, tenant_id: &str, token: AccessToken) {
        let mut lock = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        lock.insert(tenant_id.to_string(), token);
    }

    /// Drop the cached token for `tenant_id`, forcing the next call to re-authenticate.
    pub fn invalidate(&self, tenant_id: &str) {
        let mut lock = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        lock.remove(tenant_id);
    }
}
