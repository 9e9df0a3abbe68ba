use aps_common::Secret;
use log::*;

use crate::{
    credentials::{AppIdentity, NewTenant, RegistrationOutcome, TenantCredentials},
    db::{CredentialStore, CredentialStoreError},
    helpers::{calculate_hmac, generate_shared_secret},
};

/// Drives the two-step registration handshake and the tenant credential lifecycle.
///
/// The handshake has exactly one transition per tenant: `register` creates the record and issues
/// the shared secret, `confirm` merges in the OAuth client pair. Signature verification is the
/// caller's job and must happen *before* either step runs; both steps fail closed and leave the
/// store untouched when their own preconditions fail.
#[derive(Clone)]
pub struct CredentialApi<B> {
    store: B,
    app: AppIdentity,
}

impl<B: CredentialStore> CredentialApi<B> {
    pub fn new(app: AppIdentity, store: B) -> Self {
        Self { store, app }
    }

    pub fn app(&self) -> &AppIdentity {
        &self.app
    }

    /// Register a tenant, issuing a fresh shared secret.
    ///
    /// The secret is generated server-side and never accepted from the request. Registering a
    /// tenant that already has a record replaces it wholesale: a reinstall always wins, and
    /// traffic signed with the previous secret stops verifying from this point on.
    ///
    /// The returned proof is `HMAC-SHA256(app_secret, tenant_id || tenant_base_url || app_name)`,
    /// which the platform uses to check that it reached the application it meant to.
    pub async fn register(&self, tenant: NewTenant) -> Result<RegistrationOutcome, CredentialStoreError> {
        let shared_secret = Secret::new(generate_shared_secret());
        let proof_message = format!("{}{}{}", tenant.tenant_id, tenant.tenant_base_url, self.app.name);
        let proof = calculate_hmac(self.app.secret.reveal(), proof_message.as_bytes());
        let credentials = TenantCredentials {
            tenant_id: tenant.tenant_id,
            tenant_base_url: tenant.tenant_base_url,
            shared_secret: shared_secret.clone(),
            api_key: None,
            api_secret: None,
            registered_at: tenant.timestamp,
        };
        let tenant_id = credentials.tenant_id.clone();
        self.store.store(credentials).await?;
        info!("🤝 Registered tenant {tenant_id}");
        Ok(RegistrationOutcome { shared_secret, proof })
    }

    /// Complete the handshake by merging the OAuth client pair into an existing record.
    ///
    /// Confirming a tenant that never registered is a hard error, never an implicit create. All
    /// other fields of the record are left untouched.
    pub async fn confirm(
        &self,
        tenant_id: &str,
        api_key: String,
        api_secret: Secret<String>,
    ) -> Result<(), CredentialStoreError> {
        let mut credentials = self.store.get(tenant_id).await?;
        credentials.api_key = Some(api_key);
        credentials.api_secret = Some(api_secret);
        self.store.store(credentials).await?;
        info!("🤝 Confirmed registration for tenant {tenant_id}");
        Ok(())
    }

    /// Fetch the full credential record for a tenant.
    pub async fn fetch(&self, tenant_id: &str) -> Result<TenantCredentials, CredentialStoreError> {
        self.store.get(tenant_id).await
    }

    /// Remove a tenant's record entirely (app uninstall). Unknown tenants are an error.
    pub async fn uninstall(&self, tenant_id: &str) -> Result<(), CredentialStoreError> {
        self.store.delete(tenant_id).await?;
        info!("🤝 Uninstalled tenant {tenant_id}");
        Ok(())
    }
}
