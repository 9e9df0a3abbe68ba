use std::env;

use aps_common::Secret;
use log::*;
use trust_engine::AppIdentity;

const DEFAULT_APS_HOST: &str = "127.0.0.1";
const DEFAULT_APS_PORT: u16 = 8420;

/// Server configuration, loaded from `APS_*` environment variables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The public base URL of this server. Used to build the confirmation URL handed back to the
    /// platform during registration, so it must be reachable from the platform's side.
    pub server_url: String,
    /// The technical name of the app, as declared on the platform.
    pub app_name: String,
    /// The secret shared between the app and the platform. Signs registration requests and the
    /// registration proof; tenant traffic is signed with per-tenant secrets instead.
    pub app_secret: Secret<String>,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_APS_HOST.to_string(),
            port: DEFAULT_APS_PORT,
            server_url: format!("http://{DEFAULT_APS_HOST}:{DEFAULT_APS_PORT}"),
            app_name: String::default(),
            app_secret: Secret::default(),
            database_url: String::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("APS_HOST").ok().unwrap_or_else(|| DEFAULT_APS_HOST.into());
        let port = env::var("APS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for APS_PORT. {e} Using the default, {DEFAULT_APS_PORT}, instead."
                    );
                    DEFAULT_APS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_APS_PORT);
        let server_url = env::var("APS_SERVER_URL").ok().unwrap_or_else(|| {
            let url = format!("http://{host}:{port}");
            warn!("🪛️ APS_SERVER_URL is not set. Using {url}, which the platform probably cannot reach.");
            url
        });
        let app_name = env::var("APS_APP_NAME").ok().unwrap_or_else(|| {
            error!("🪛️ APS_APP_NAME is not set. Please set it to the app name declared on the platform.");
            String::default()
        });
        let app_secret = Secret::new(env::var("APS_APP_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ APS_APP_SECRET is not set. Registration requests cannot be verified without it.");
            String::default()
        }));
        let database_url = env::var("APS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ APS_DATABASE_URL is not set. Please set it to the URL for the credential database.");
            String::default()
        });
        Self { host, port, server_url, app_name, app_secret, database_url }
    }

    pub fn app_identity(&self) -> AppIdentity {
        AppIdentity { name: self.app_name.clone(), secret: self.app_secret.clone() }
    }
}

/// The subset of the configuration that request handlers need. Kept small and free of secrets so
/// it can be passed around the system without ceremony.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub server_url: String,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { server_url: config.server_url.clone() }
    }

    /// Where the platform must POST the confirmation step of the handshake.
    pub fn confirmation_url(&self) -> String {
        format!("{}/setup/register-confirm", self.server_url)
    }
}
