use std::sync::Arc;

use chrono::{Duration, Utc};
use log::*;
use reqwest::{header::HeaderValue, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{config::ApiCredentials, error::PlatformApiError, token_cache::AccessToken, TokenCache};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Authenticated façade over one tenant's admin API.
///
/// A fresh instance is built for every handler invocation from that tenant's credentials; the
/// token cache is the only shared state. Token resolution is lazy: a cache hit skips the OAuth
/// exchange entirely, and a 401 from the platform is treated as "invalidate and refetch", not as
/// fatal.
#[derive(Clone)]
pub struct PlatformApi {
    app_name: String,
    credentials: ApiCredentials,
    tokens: Arc<TokenCache>,
    client: Arc<Client>,
}

impl PlatformApi {
    pub fn new(
        app_name: &str,
        credentials: ApiCredentials,
        tokens: Arc<TokenCache>,
    ) -> Result<Self, PlatformApiError> {
        let mut headers = reqwest::header::HeaderMap::with_capacity(2);
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PlatformApiError::Initialization(e.to_string()))?;
        Ok(Self { app_name: app_name.to_string(), credentials, tokens, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.credentials.base_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, PlatformApiError> {
        let token = self.access_token().await?;
        let mut response = self.send(method.clone(), path, body, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            // The cached token may have been revoked on the platform side even though it has
            // not expired locally. Invalidate and retry once with a fresh one.
            debug!("Got a 401 from tenant {}. Refreshing the access token.", self.credentials.tenant_id);
            self.tokens.invalidate(&self.credentials.tenant_id);
            let token = self.access_token().await?;
            response = self.send(method, path, body, &token).await?;
        }
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PlatformApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PlatformApiError::ResponseError(e.to_string()))?;
            Err(PlatformApiError::QueryError { status, message })
        }
    }

    /// Fetch this app's configuration from the tenant's system config store.
    pub async fn get_app_config(&self) -> Result<Value, PlatformApiError> {
        let path = format!("/api/_action/system-config?domain={}.config", self.app_name);
        debug!("Fetching app config for tenant {}", self.credentials.tenant_id);
        self.rest_query::<Value, ()>(Method::GET, &path, None).await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: &AccessToken,
    ) -> Result<reqwest::Response, PlatformApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url).bearer_auth(&token.access_token);
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await.map_err(|e| PlatformApiError::RequestError(e.to_string()))
    }

    /// The tenant's access token: from the shared cache when possible, via the OAuth2
    /// client-credentials grant otherwise.
    async fn access_token(&self) -> Result<AccessToken, PlatformApiError> {
        if let Some(token) = self.tokens.get(&self.credentials.tenant_id) {
            trace!("Access token cache hit for tenant {}", self.credentials.tenant_id);
            return Ok(token);
        }
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.api_key.as_str()),
            ("client_secret", self.credentials.api_secret.reveal().as_str()),
        ];
        let response = self
            .client
            .post(self.credentials.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| PlatformApiError::TokenError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformApiError::TokenError(format!("token endpoint returned {status}: {message}")));
        }
        let token: TokenResponse =
            response.json().await.map_err(|e| PlatformApiError::TokenError(e.to_string()))?;
        let token = AccessToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        };
        self.tokens.put(&self.credentials.tenant_id, token.clone());
        debug!("Fetched a new access token for tenant {}", self.credentials.tenant_id);
        Ok(token)
    }
}
