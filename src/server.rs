// ABOUTME: Shared server resources and the HTTP server entry point
// ABOUTME: Wires database, auth, and object storage into the axum router and serves it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Server composition root.
//!
//! [`ServerResources`] bundles every long-lived collaborator behind one `Arc`
//! so handlers clone pointers, never resources. [`HttpServer`] binds the
//! listener and runs the router built in [`crate::routes`].

use crate::auth::AuthMiddleware;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::storage::ObjectStore;
use std::sync::Arc;

/// Long-lived dependencies shared by every request handler
pub struct ServerResources {
    /// Persistence layer
    pub database: Database,
    /// Request authentication
    pub auth: AuthMiddleware,
    /// Uploaded image storage
    pub object_store: Arc<dyn ObjectStore>,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the server's collaborators
    #[must_use]
    pub fn new(
        database: Database,
        auth: AuthMiddleware,
        object_store: Arc<dyn ObjectStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            auth,
            object_store,
            config,
        }
    }
}

/// HTTP server driving the API router
pub struct HttpServer {
    resources: Arc<ServerResources>,
}

impl HttpServer {
    /// Create a server over the shared resources
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Bind the configured port and serve until the process is stopped
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the accept loop fails.
    pub async fn run(self) -> AppResult<()> {
        let port = self.resources.config.http_port;
        let router = crate::routes::api_router(self.resources);

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| AppError::config(format!("Failed to bind port {port}: {e}")))?;

        tracing::info!(port = port, "HTTP server listening");

        axum::serve(listener, router)
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))
    }
}
