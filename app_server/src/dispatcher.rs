//! Routes verified envelopes to registered handler closures.
//!
//! Handlers are registered at startup, before the server runs, so the registries are plain
//! `HashMap`s behind no lock. Each invocation gets a [`PlatformApi`] scoped to the originating
//! tenant, built from that tenant's stored credentials. Dispatch checks run in a fixed order:
//! required routing fields first, then handler lookup, then credential resolution. A tenant that
//! registered but never confirmed has no OAuth pair, so dispatching for it fails rather than
//! handing a handler a client that cannot authenticate.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use log::*;
use platform_tools::{ApiCredentials, PlatformApi, PlatformApiError, TokenCache};
use thiserror::Error;
use trust_engine::{CredentialApi, CredentialStore, CredentialStoreError};

use crate::data_objects::{ActionRequest, WebhookRequest};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = BoxFuture<'static, Result<(), HandlerError>>;
pub type WebhookHandler = Arc<dyn Fn(WebhookRequest, PlatformApi) -> HandlerResult + Send + Sync>;
pub type ActionHandler = Arc<dyn Fn(ActionRequest, PlatformApi) -> HandlerResult + Send + Sync>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing action or entity")]
    MissingAction,
    #[error("missing event")]
    MissingEvent,
    #[error("no action handler found for entity {entity}, action {action}")]
    ActionHandlerNotFound { entity: String, action: String },
    #[error("no webhook handler found for event: {0}")]
    WebhookHandlerNotFound(String),
    #[error("tenant {0} has not confirmed its registration")]
    CredentialsNotConfirmed(String),
    #[error("get tenant credentials: {0}")]
    Credentials(#[from] CredentialStoreError),
    #[error("could not build the tenant API client: {0}")]
    ApiClient(#[from] PlatformApiError),
    #[error("handler failed: {0}")]
    Handler(HandlerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ActionKey {
    entity: String,
    action: String,
}

/// The handler registries for webhooks and admin actions.
#[derive(Clone, Default)]
pub struct Dispatcher {
    webhooks: HashMap<String, WebhookHandler>,
    actions: HashMap<ActionKey, ActionHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a webhook event. Registering the same event twice replaces the
    /// earlier handler.
    pub fn on_event<H>(&mut self, event: &str, handler: H)
    where H: Fn(WebhookRequest, PlatformApi) -> HandlerResult + Send + Sync + 'static {
        if self.webhooks.insert(event.to_string(), Arc::new(handler)).is_some() {
            warn!("🚚️ Replacing the existing handler for webhook event {event}");
        }
    }

    /// Register a handler for an `(entity, action)` pair. Last registration wins, as with
    /// [`on_event`](Self::on_event).
    pub fn on_action<H>(&mut self, entity: &str, action: &str, handler: H)
    where H: Fn(ActionRequest, PlatformApi) -> HandlerResult + Send + Sync + 'static {
        let key = ActionKey { entity: entity.to_string(), action: action.to_string() };
        if self.actions.insert(key, Arc::new(handler)).is_some() {
            warn!("🚚️ Replacing the existing handler for action {entity}/{action}");
        }
    }

    pub async fn dispatch_webhook<B: CredentialStore>(
        &self,
        request: WebhookRequest,
        credentials: &CredentialApi<B>,
        tokens: Arc<TokenCache>,
    ) -> Result<(), DispatchError> {
        if request.data.event.is_empty() {
            return Err(DispatchError::MissingEvent);
        }
        let handler = self
            .webhooks
            .get(&request.data.event)
            .ok_or_else(|| DispatchError::WebhookHandlerNotFound(request.data.event.clone()))?
            .clone();
        let api = scoped_api(credentials, &request.source.tenant_id, tokens).await?;
        debug!("🚚️ Dispatching webhook {} for tenant {}", request.data.event, request.source.tenant_id);
        handler(request, api).await.map_err(DispatchError::Handler)
    }

    pub async fn dispatch_action<B: CredentialStore>(
        &self,
        request: ActionRequest,
        credentials: &CredentialApi<B>,
        tokens: Arc<TokenCache>,
    ) -> Result<(), DispatchError> {
        if request.data.entity.is_empty() || request.data.action.is_empty() {
            return Err(DispatchError::MissingAction);
        }
        let key = ActionKey { entity: request.data.entity.clone(), action: request.data.action.clone() };
        let handler = self
            .actions
            .get(&key)
            .ok_or(DispatchError::ActionHandlerNotFound { entity: key.entity, action: key.action })?
            .clone();
        let api = scoped_api(credentials, &request.source.tenant_id, tokens).await?;
        debug!(
            "🚚️ Dispatching action {}/{} for tenant {}",
            request.data.entity, request.data.action, request.source.tenant_id
        );
        handler(request, api).await.map_err(DispatchError::Handler)
    }
}

/// Build a [`PlatformApi`] for the tenant an envelope came from.
async fn scoped_api<B: CredentialStore>(
    credentials: &CredentialApi<B>,
    tenant_id: &str,
    tokens: Arc<TokenCache>,
) -> Result<PlatformApi, DispatchError> {
    let record = credentials.fetch(tenant_id).await?;
    let (api_key, api_secret) = match (record.api_key, record.api_secret) {
        (Some(key), Some(secret)) => (key, secret),
        _ => return Err(DispatchError::CredentialsNotConfirmed(tenant_id.to_string())),
    };
    let api_credentials = ApiCredentials {
        tenant_id: record.tenant_id,
        base_url: record.tenant_base_url,
        api_key,
        api_secret,
    };
    let api = PlatformApi::new(&credentials.app().name, api_credentials, tokens)?;
    Ok(api)
}
