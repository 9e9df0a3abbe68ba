//! # App server
//!
//! The HTTP face of the app: actix-web routes for the registration handshake, webhook and action
//! ingress, embedded page loads and health checks, glued to the trust engine for verification
//! and credential storage and to the platform tools for calling back into tenant installations.

pub mod config;
pub mod data_objects;
pub mod dispatcher;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
