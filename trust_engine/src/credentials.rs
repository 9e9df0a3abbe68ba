use aps_common::Secret;
use serde::{Deserialize, Serialize};

/// The credential record held for every registered tenant.
///
/// A record is created when the tenant registers (which issues the shared secret) and updated
/// when the tenant confirms the handshake (which supplies the OAuth client pair). The API key and
/// secret are therefore absent until confirmation has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredentials {
    pub tenant_id: String,
    pub tenant_base_url: String,
    /// Symmetric key used to HMAC-verify all inbound traffic for this tenant. Generated
    /// server-side at registration and never accepted from the wire.
    pub shared_secret: Secret<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<Secret<String>>,
    /// Timestamp supplied by the platform at registration time. Kept verbatim.
    pub registered_at: String,
}

/// The registration request parameters, as signed by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTenant {
    pub tenant_id: String,
    pub tenant_base_url: String,
    pub timestamp: String,
}

/// What the registration step hands back to the platform.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    /// The freshly generated shared secret for the tenant.
    pub shared_secret: Secret<String>,
    /// Hex-encoded `HMAC-SHA256(app_secret, tenant_id || tenant_base_url || app_name)`. The
    /// platform uses this to assert the application's identity independently of the shared
    /// secret.
    pub proof: String,
}

/// The application's own identity: its name and the secret it shares with the platform.
///
/// The app secret signs registration requests (no tenant record exists at that point) and the
/// registration proof. It is never used to verify tenant traffic.
#[derive(Debug, Clone, Default)]
pub struct AppIdentity {
    pub name: String,
    pub secret: Secret<String>,
}

impl AppIdentity {
    pub fn new<S: Into<String>>(name: S, secret: S) -> Self {
        Self { name: name.into(), secret: Secret::new(secret.into()) }
    }
}
