//! Wire types for the HTTP surface.
//!
//! The envelope types are deliberately lenient: only the fields the server itself routes on are
//! required, everything else defaults, so a platform that adds envelope fields does not break
//! dispatch. The raw payload is passed through to handlers untouched as a [`serde_json::Value`].

use aps_common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies the tenant a request originates from. Present in every envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_base_url: String,
    #[serde(default)]
    pub app_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub language_id: String,
}

/// A webhook delivery. Routed on `data.event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub data: WebhookData,
    pub source: Source,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// An admin-triggered action. Routed on the `(data.entity, data.action)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub data: ActionData,
    pub source: Source,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub action: String,
}

/// Body of the confirmation POST that completes the registration handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationRequest {
    pub tenant_id: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
    #[serde(default)]
    pub timestamp: String,
}

/// What the registration endpoint hands back to the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub proof: String,
    pub secret: String,
    pub confirmation_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}
