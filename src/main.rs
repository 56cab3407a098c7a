use actix_web::{web, App, HttpServer};
use pulid_relay::{
    logger::{self, LoggerConfig},
    server::{self, AppState},
    PulidClient, RelayConfig,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = RelayConfig::from_env();
    logger::init_with_config(LoggerConfig::from_settings(&config.log))?;

    if dotenv_loaded {
        log::info!(".env file loaded");
    } else {
        log::warn!("No .env file found, using system environment variables");
    }

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.server.host,
        config.server.port,
    );
    logger::log_config_info(&config);

    let client = match PulidClient::new(config.pulid.clone()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to initialize PuLID client: {}", e);
            return Err(e.into());
        }
    };

    let state = web::Data::new(AppState::new(Arc::new(client)));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(server::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    log::info!("Server stopped");
    Ok(())
}
