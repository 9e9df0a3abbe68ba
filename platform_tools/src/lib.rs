mod api;
mod config;
mod error;
mod token_cache;

pub use api::PlatformApi;
pub use config::ApiCredentials;
pub use error::PlatformApiError;
pub use token_cache::{AccessToken, TokenCache};
