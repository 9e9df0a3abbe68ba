//! Request verification.
//!
//! Two verification modes share one HMAC primitive:
//!
//! * **Payload mode** (POST bodies): the signature covers the raw body bytes exactly as sent,
//!   and the tenant key is resolved by parsing the envelope's `source.tenant_id` first.
//!   Verification therefore needs the body as an in-memory value that the caller can afterwards
//!   hand to payload parsing; it never consumes a stream.
//! * **Query mode** (GET callbacks): the signature covers the raw query string with the
//!   signature parameter's own `key=value` pair textually removed and the remainder
//!   percent-decoded. The query is never re-serialized: the platform signed the original string,
//!   and any re-encoding or re-ordering would desynchronize the two sides.
//!
//! Every failure collapses into [`SignatureVerificationError`], which renders as a single
//! opaque message. Which sub-check failed (unknown tenant, malformed body, forged digest) is
//! deliberately not observable from outside; the cause is retained on the error's `source`
//! chain for logging.

use log::*;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    credentials::AppIdentity,
    db::{CredentialStore, CredentialStoreError},
    helpers::{verify_signature, SignatureError},
    SIGNATURE_PARAM,
};

/// The opaque verification error. Displays as "invalid signature" regardless of the root cause.
#[derive(Debug, Error)]
#[error("invalid signature")]
pub struct SignatureVerificationError {
    #[source]
    cause: VerificationFailure,
}

impl SignatureVerificationError {
    pub fn new(cause: impl Into<VerificationFailure>) -> Self {
        let cause = cause.into();
        debug!("🔐️ Signature verification failed: {cause}");
        Self { cause }
    }
}

/// The inner reason a verification failed. Never shown to API callers.
#[derive(Debug, Error)]
pub enum VerificationFailure {
    #[error("parse body: {0}")]
    ParseBody(#[from] serde_json::Error),
    #[error("get tenant credentials: {0}")]
    Credentials(#[from] CredentialStoreError),
    #[error("decode signature: {0}")]
    DecodeSignature(#[from] hex::FromHexError),
    #[error("decode query: {0}")]
    DecodeQuery(String),
    #[error("missing query parameter: tenant_id")]
    MissingTenantId,
    #[error("missing query parameter: {SIGNATURE_PARAM}")]
    MissingSignature,
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// The subset of the envelope that verification needs before the real payload parse happens.
#[derive(Deserialize)]
struct MinimalEnvelope {
    source: MinimalSource,
}

#[derive(Deserialize)]
struct MinimalSource {
    tenant_id: String,
}

/// Authenticates inbound requests against the credential store and the app's own secret.
#[derive(Clone)]
pub struct VerificationApi<B> {
    store: B,
    app: AppIdentity,
}

impl<B: CredentialStore> VerificationApi<B> {
    pub fn new(app: AppIdentity, store: B) -> Self {
        Self { store, app }
    }

    /// Payload-mode verification for envelope-shaped bodies (webhooks and actions).
    ///
    /// Parses `source.tenant_id` out of `body`, resolves that tenant's shared secret and checks
    /// the hex signature from the request header against the raw body bytes.
    pub async fn verify_payload(&self, body: &[u8], signature: &str) -> Result<(), SignatureVerificationError> {
        let envelope: MinimalEnvelope = serde_json::from_slice(body).map_err(SignatureVerificationError::new)?;
        self.verify_payload_for(&envelope.source.tenant_id, body, signature).await
    }

    /// Payload-mode verification when the tenant id is already known (the confirmation step,
    /// whose body is not an envelope).
    pub async fn verify_payload_for(
        &self,
        tenant_id: &str,
        body: &[u8],
        signature: &str,
    ) -> Result<(), SignatureVerificationError> {
        let credentials = self.store.get(tenant_id).await.map_err(SignatureVerificationError::new)?;
        let signature = hex::decode(signature).map_err(SignatureVerificationError::new)?;
        verify_signature(body, &signature, credentials.shared_secret.reveal())
            .map_err(SignatureVerificationError::new)?;
        trace!("🔐️ Payload signature for tenant {tenant_id} ✅️");
        Ok(())
    }

    /// Query-mode verification keyed by the tenant's shared secret (embedded page loads).
    ///
    /// The tenant id comes from the required `tenant_id` query parameter; its absence is its own
    /// failure, distinct from a digest mismatch.
    pub async fn verify_tenant_query(&self, raw_query: &str) -> Result<(), SignatureVerificationError> {
        let tenant_id = query_param(raw_query, "tenant_id")
            .ok_or_else(|| SignatureVerificationError::new(VerificationFailure::MissingTenantId))?;
        let credentials = self.store.get(&tenant_id).await.map_err(SignatureVerificationError::new)?;
        verify_query_with_key(raw_query, credentials.shared_secret.reveal())?;
        trace!("🔐️ Query signature for tenant {tenant_id} ✅️");
        Ok(())
    }

    /// Query-mode verification keyed by the application's own secret (the registration request;
    /// no tenant record exists yet).
    pub fn verify_app_query(&self, raw_query: &str) -> Result<(), SignatureVerificationError> {
        verify_query_with_key(raw_query, self.app.secret.reveal())?;
        trace!("🔐️ Registration query signature ✅️");
        Ok(())
    }
}

fn verify_query_with_key(raw_query: &str, key: &str) -> Result<(), SignatureVerificationError> {
    let signature = query_param_raw(raw_query, SIGNATURE_PARAM)
        .ok_or_else(|| SignatureVerificationError::new(VerificationFailure::MissingSignature))?;
    let canonical = canonical_query(raw_query, &signature).map_err(SignatureVerificationError::new)?;
    let signature = hex::decode(signature.as_bytes()).map_err(SignatureVerificationError::new)?;
    verify_signature(canonical.as_bytes(), &signature, key).map_err(SignatureVerificationError::new)
}

/// Strip the signature pair from the raw query string and percent-decode the remainder.
///
/// The removal is purely textual, mirroring how the platform computes the digest over the
/// original string minus the signature it is about to append.
fn canonical_query(raw_query: &str, signature: &str) -> Result<String, VerificationFailure> {
    let pair = format!("{SIGNATURE_PARAM}={signature}");
    let stripped = if raw_query.contains(&format!("&{pair}")) {
        raw_query.replacen(&format!("&{pair}"), "", 1)
    } else if raw_query.starts_with(&format!("{pair}&")) {
        raw_query.replacen(&format!("{pair}&"), "", 1)
    } else {
        raw_query.replacen(&pair, "", 1)
    };
    let decoded = urlencoding::decode(&stripped).map_err(|e| VerificationFailure::DecodeQuery(e.to_string()))?;
    Ok(decoded.into_owned())
}

/// The raw (still percent-encoded) value of a query parameter.
fn query_param_raw(raw_query: &str, name: &str) -> Option<String> {
    raw_query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// The percent-decoded value of a query parameter.
fn query_param(raw_query: &str, name: &str) -> Option<String> {
    let raw = query_param_raw(raw_query, name)?;
    urlencoding::decode(&raw).ok().map(|v| v.into_owned())
}
