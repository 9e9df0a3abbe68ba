use app_server::{config::ServerConfig, dispatcher::Dispatcher, server::run_server};
use dotenvy::dotenv;
use log::info;

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = ServerConfig::from_env_or_default();

    info!("🚀️ Starting app server on {}:{}", config.host, config.port);
    // Handlers are registered in code. Out of the box the binary serves the registration
    // handshake and health checks, and rejects unrouted webhooks and actions.
    let dispatcher = Dispatcher::new();
    match run_server(config, dispatcher).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
