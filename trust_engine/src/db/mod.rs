//! Credential storage backends.
//!
//! The [`CredentialStore`] trait defines the contract every backend must satisfy. Both provided
//! backends hold one record per tenant, keyed by the tenant id, with identical semantics:
//! `store` is an upsert, and `get`/`delete` on an unknown tenant surface
//! [`CredentialStoreError::NotFound`] rather than succeeding silently.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;
pub use traits::{CredentialStore, CredentialStoreError};
