//! # mini_httpd - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: lee la configuración, arma el router y
//! arranca el pool de workers.

use anyhow::{anyhow, Context, Result};
use mini_httpd::commands;
use mini_httpd::config::Config;
use mini_httpd::http::HeaderOptions;
use mini_httpd::router::{AuthTable, Router};
use mini_httpd::server::Server;
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    // Crear configuración (CLI o variables de entorno)
    let config = Config::new();
    config.validate().map_err(|e| anyhow!(e)).context("invalid configuration")?;
    config.log_summary();

    let auth = match &config.auth_file {
        Some(path) => AuthTable::from_json_file(Path::new(path))
            .with_context(|| format!("failed to load auth file {}", path))?,
        None => AuthTable::new(),
    };
    info!(entries = auth.len(), "auth table");

    let options = HeaderOptions::new(&config.server_name).with_date(config.send_date);
    let router = Router::new(&config.root)
        .with_options(options)
        .with_auth(auth)
        .with_chunk_size(config.chunk_size)
        .with_file_time(config.use_file_time);
    let router = commands::register_samples(router);

    // Iniciar el servidor (esto bloqueará el thread)
    let address = config.address();
    Server::new(config, router)
        .run()
        .with_context(|| format!("failed to start server on {}", address))
}
