use aps_common::Secret;

/// Everything [`PlatformApi`](crate::PlatformApi) needs to call back into one tenant's
/// installation: where to reach it and which OAuth client pair to authenticate with.
///
/// The app server builds one of these per handler invocation from the tenant's stored
/// credentials; the OAuth pair only exists once the tenant has confirmed its registration.
#[derive(Debug, Clone, Default)]
pub struct ApiCredentials {
    pub tenant_id: String,
    /// Base URL of the tenant's installation, e.g. "https://shop.example.com".
    pub base_url: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
}

impl ApiCredentials {
    pub fn new<S: Into<String>>(tenant_id: S, base_url: S, api_key: S, api_secret: S) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: Secret::new(api_secret.into()),
        }
    }

    /// The tenant's OAuth2 client-credentials token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/api/oauth/token", self.base_url)
    }
}
