//! The public trust API.
//!
//! [`CredentialApi`] drives the registration handshake and tenant lifecycle against a
//! [`CredentialStore`](crate::CredentialStore) backend. [`VerificationApi`] authenticates inbound
//! requests in both payload mode and query mode.

mod credential_api;
mod verification_api;

pub use credential_api::CredentialApi;
pub use verification_api::{SignatureVerificationError, VerificationApi, VerificationFailure};
