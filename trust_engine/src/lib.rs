//! # Trust engine
//!
//! This library contains the trust core of the app server: everything needed to establish a
//! per-tenant shared secret and to authenticate every inbound request against it afterwards.
//!
//! The library is divided into three main sections:
//! 1. Credential storage. A [`CredentialStore`] holds one record per tenant, keyed by
//!    the tenant id. Two interchangeable backends are provided: an in-memory map for tests and
//!    development, and a SQLite-backed store for production. Callers depend only on the trait.
//! 2. Signature primitives ([`mod@helpers`]). HMAC-SHA256 computation and constant-time
//!    verification over raw request bytes.
//! 3. The trust API ([`mod@api`]). [`CredentialApi`] drives the two-step registration handshake
//!    (register, then confirm) and tenant removal; [`VerificationApi`] authenticates payload-mode
//!    and query-mode requests, resolving the tenant secret from the store.
//!
//! Specific backends need to implement [`CredentialStore`] in order to act as storage for the
//! app server.

mod db;

pub mod api;
pub mod credentials;
pub mod helpers;

pub use api::{CredentialApi, SignatureVerificationError, VerificationApi};
pub use credentials::{AppIdentity, NewTenant, RegistrationOutcome, TenantCredentials};
pub use db::{CredentialStore, CredentialStoreError, MemoryCredentialStore, SqliteCredentialStore};

/// Header carrying the hex-encoded HMAC for payload-mode (POST) requests.
pub const SIGNATURE_HEADER: &str = "x-platform-signature";
/// Query parameter carrying the hex-encoded HMAC for query-mode (GET) requests.
pub const SIGNATURE_PARAM: &str = "signature";
