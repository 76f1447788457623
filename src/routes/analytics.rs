// ABOUTME: Route handler for the analytics endpoint
// ABOUTME: Fetches the meal window and runs the pure aggregation over it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Analytics routes
//!
//! One endpoint: fetch the caller's meals for the requested window and hand
//! them to [`crate::analytics::aggregate`]. Nothing is precomputed or cached.

use crate::errors::AppError;
use crate::routes::meals::ListMealsQuery;
use crate::routes::ApiResponse;
use crate::server::ServerResources;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Analytics routes handler
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create the analytics route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analytics", get(Self::handle_analytics))
            .with_state(resources)
    }

    /// Handle GET /api/analytics - Aggregate statistics over a meal window
    async fn handle_analytics(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListMealsQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let (start, end) = query.window()?;
        let meals = resources
            .database
            .meals()
            .list(auth.user_id, start, end)
            .await?;
        let analytics = crate::analytics::aggregate(&meals);
        Ok((StatusCode::OK, Json(ApiResponse::new(analytics))).into_response())
    }
}
