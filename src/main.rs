//! lobbyd - multiplayer game lobby server
//!
//! Players log in over a line protocol, open battle rooms, request to join
//! them, add AI bots and chat, while admins tune flood protection and
//! manage bans.

mod config;
mod db;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod security;
mod services;
mod state;
mod telemetry;

use std::sync::Arc;

use anyhow::Context as _;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{BanBackend, Config, LogFormat};
use crate::db::{BanService, Database, NoopBanService, SqliteBanService};
use crate::handlers::Registry;
use crate::network::Gateway;
use crate::security::FloodProtection;
use crate::services::{AccountStore, Agreement, UpdateCatalog};
use crate::state::{Lobby, LobbyParams, ServerInfo};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    // `lobbyd --hash-password <pw>` prints an argon2 hash for `[[account]]` blocks
    if first.as_deref() == Some("--hash-password") {
        let password = args
            .next()
            .context("usage: lobbyd --hash-password <password>")?;
        let hash = security::password::hash_password(&password)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        println!("{hash}");
        return Ok(());
    }

    // Load configuration
    let config_path = first.unwrap_or_else(|| "config.toml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // Tracing is configured from the file, so report this one on stderr
            eprintln!("Failed to load config {config_path}: {e}");
            return Err(e.into());
        }
    };

    init_tracing(config.server.log_format);

    info!(
        server = %config.server.name,
        protocol = %config.server.protocol_version,
        "Starting lobbyd"
    );

    // Ban store
    let bans: Arc<dyn BanService> = match config.bans.backend {
        BanBackend::Sqlite => {
            let db = Database::new(&config.bans.path).await.map_err(|e| {
                error!(path = %config.bans.path, error = %e, "Failed to open ban database");
                e
            })?;
            info!(path = %config.bans.path, "Using SQLite ban store");
            Arc::new(SqliteBanService::new(&db))
        }
        BanBackend::None => {
            info!("Ban store disabled. Using NoOp.");
            Arc::new(NoopBanService)
        }
    };

    let agreement = Agreement::load(&config.agreement)
        .with_context(|| "failed to read agreement text".to_string())?;
    if agreement.is_required() {
        info!("Agreement loaded");
    }

    let accounts = AccountStore::from_config(&config.accounts, config.server.allow_guests);
    info!(
        accounts = accounts.len(),
        guests = config.server.allow_guests,
        "Accounts loaded"
    );

    // Create the Lobby (shared state)
    let lobby = Arc::new(Lobby::new(LobbyParams {
        server: ServerInfo {
            name: config.server.name.clone(),
            protocol_version: config.server.protocol_version.clone(),
        },
        flood: FloodProtection::from_config(&config.flood),
        flood_action: config.flood.action,
        bans,
        accounts,
        agreement,
        updates: UpdateCatalog::new(&config.updates),
    }));

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    match config.server.metrics_port {
        None | Some(0) => info!("Metrics disabled"),
        Some(port) => {
            metrics::init();
            info!("Metrics initialized");

            tokio::spawn(async move {
                http::run_http_server(port).await;
            });
            info!(port, "Prometheus HTTP server started");
        }
    }

    // Create command handler registry
    let registry = Arc::new(Registry::new());
    info!(commands = registry.commands().len(), "Command registry ready");

    let gateway = Gateway::bind(
        config.listen.address,
        config.listen.max_line_length,
        lobby,
        registry,
    )
    .await?;

    gateway.run().await?;

    Ok(())
}
