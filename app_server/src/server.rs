use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use log::*;
use platform_tools::TokenCache;
use trust_engine::{CredentialApi, CredentialStore, SqliteCredentialStore, VerificationApi};

use crate::{
    config::{ServerConfig, ServerOptions},
    dispatcher::Dispatcher,
    errors::ServerError,
    routes::{health, ActionRoute, ConfirmRoute, PageRoute, RegisterRoute, WebhookRoute},
};

/// Open the credential database and run the server until it is shut down.
pub async fn run_server(config: ServerConfig, dispatcher: Dispatcher) -> Result<(), ServerError> {
    let store = SqliteCredentialStore::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, store, dispatcher)?;
    Ok(srv.await?)
}

/// Build the server instance over any credential store backend.
pub fn create_server_instance<B: CredentialStore>(
    config: ServerConfig,
    store: B,
    dispatcher: Dispatcher,
) -> Result<Server, ServerError> {
    let app_identity = config.app_identity();
    let tokens = web::Data::new(TokenCache::new());
    let dispatcher = web::Data::new(dispatcher);
    let options = web::Data::new(ServerOptions::from_config(&config));
    let srv = HttpServer::new(move || {
        let verifier = VerificationApi::new(app_identity.clone(), store.clone());
        let credentials = CredentialApi::new(app_identity.clone(), store.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("aps::access_log"))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(credentials))
            .app_data(tokens.clone())
            .app_data(dispatcher.clone())
            .app_data(options.clone())
            .route("/health", web::get().to(health))
            .service(RegisterRoute::<B>::new())
            .service(ConfirmRoute::<B>::new())
            .service(WebhookRoute::<B>::new())
            .service(ActionRoute::<B>::new())
            .service(PageRoute::<B>::new())
    })
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("🚀️ App server is running on {}:{}", config.host, config.port);
    Ok(srv)
}
