// ABOUTME: Health check route for load balancers and monitoring
// ABOUTME: Reports service status and verifies database connectivity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

use crate::errors::AppError;
use crate::routes::ApiResponse;
use crate::server::ServerResources;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status string
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/health", get(Self::handle_health))
            .with_state(resources)
    }

    /// Handle GET /api/health - Unauthenticated liveness and DB check
    async fn handle_health(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        sqlx::query("SELECT 1")
            .execute(resources.database.pool())
            .await?;

        let response = HealthResponse {
            status: "ok".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        };
        Ok((StatusCode::OK, Json(ApiResponse::new(response))).into_response())
    }
}
