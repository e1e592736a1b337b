use std::process::ExitCode;

use tracing::{error, info};

use smail::{Config, Database, WebServer};

/// Configuration file read at startup.
const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = smail::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        smail::logging::init_console_only(&config.logging.level);
    }

    info!("SMAIL - disposable mailbox service");
    info!(
        domain = %config.mailbox.domain,
        turnstile = config.turnstile.enabled,
        "Server configured on {}:{}",
        config.web.host,
        config.web.port
    );

    let db = if config.database.read_only {
        Database::open_read_only(&config.database.path).await
    } else {
        Database::open(&config.database.path).await
    };
    let db = match db {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open mail store {}: {}", config.database.path, e);
            return ExitCode::FAILURE;
        }
    };

    let server = match WebServer::new(&config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create web server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
