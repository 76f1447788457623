// ABOUTME: Main server binary for the Mealtrack API
// ABOUTME: Loads configuration, wires resources, and runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Mealtrack API server.
//!
//! Configuration comes from environment variables; the flags below override
//! the most commonly changed values for local runs.

use anyhow::Result;
use clap::Parser;
use mealtrack::auth::{AuthMiddleware, HttpIdentityVerifier};
use mealtrack::config::ServerConfig;
use mealtrack::database::Database;
use mealtrack::server::{HttpServer, ServerResources};
use mealtrack::storage::LocalObjectStore;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "mealtrack-server",
    about = "Mealtrack recipe and meal tracking API server"
)]
struct ServerArgs {
    /// HTTP port override
    #[arg(long)]
    http_port: Option<u16>,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    mealtrack::logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    info!("{}", config.summary());

    let database = Database::new(&config.database.url, config.database.max_connections).await?;
    let object_store = LocalObjectStore::new(config.uploads.storage_dir.clone()).await?;
    let verifier = HttpIdentityVerifier::new(&config.auth.verify_url, config.auth.timeout_secs)?;
    let auth = AuthMiddleware::new(Arc::new(verifier));

    let resources = Arc::new(ServerResources::new(
        database,
        auth,
        Arc::new(object_store),
        config,
    ));

    HttpServer::new(resources).run().await?;
    Ok(())
}
