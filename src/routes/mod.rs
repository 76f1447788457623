// ABOUTME: Route module organization for the Mealtrack HTTP API
// ABOUTME: Response envelope, router assembly, and cross-cutting HTTP layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Route module for the Mealtrack server
//!
//! Each domain module contains route definitions and thin handler functions
//! that delegate to the persistence and aggregation layers. Every handler
//! body is wrapped in the standard `{success, data}` envelope; errors convert
//! through [`crate::errors::AppError`] into the matching `{success, error}`
//! shape.

/// Analytics routes
pub mod analytics;
/// Health check routes
pub mod health;
/// Meal log routes
pub mod meals;
/// Recipe and public catalog routes
pub mod recipes;
/// Image upload and serving routes
pub mod uploads;

pub use analytics::AnalyticsRoutes;
pub use health::HealthRoutes;
pub use meals::MealsRoutes;
pub use recipes::RecipesRoutes;
pub use uploads::UploadRoutes;

use crate::errors::{AppError, AppResult};
use crate::server::ServerResources;
use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Success half of the response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload in the success envelope
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Unwrap an extracted JSON body, mapping extractor rejections into the
/// error envelope
///
/// Handlers take `Result<Json<T>, JsonRejection>` instead of `Json<T>` so a
/// malformed body (bad JSON, unknown enum value) reaches the handler after
/// authentication and answers 400 in the standard shape, not the
/// extractor's bare 422.
pub(crate) fn require_json<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::invalid_input(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    }
}

/// Assemble the full API router with cross-cutting layers
#[must_use]
pub fn api_router(resources: Arc<ServerResources>) -> Router {
    let cors = cors_layer(&resources.config.cors.allowed_origins);
    // Multipart reads are bounded a little above the stored object limit to
    // leave room for part headers and boundaries
    let body_limit = resources.config.uploads.max_bytes + 64 * 1024;

    Router::new()
        .merge(RecipesRoutes::routes(resources.clone()))
        .merge(MealsRoutes::routes(resources.clone()))
        .merge(AnalyticsRoutes::routes(resources.clone()))
        .merge(UploadRoutes::routes(resources.clone()))
        .merge(HealthRoutes::routes(resources))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer from the configured origin list
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    if allowed_origins.trim() == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();
    base.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::new(vec![1, 2, 3])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], serde_json::json!([1, 2, 3]));
    }
}
