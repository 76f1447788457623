// ABOUTME: Route handlers for the meal log REST API
// ABOUTME: Owner-scoped meal CRUD with optional date-window listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Meal routes
//!
//! Meals are the append-heavy side of the API: the list endpoint takes an
//! optional date window and returns meals newest-first with their recipe
//! reference resolved inline.

use crate::database::meals::{CreateMealRequest, UpdateMealRequest};
use crate::errors::{AppError, AppResult};
use crate::routes::recipes::DeletedResponse;
use crate::routes::{require_json, ApiResponse};
use crate::server::ServerResources;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for listing meals
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListMealsQuery {
    /// Inclusive window start, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive window end, `YYYY-MM-DD`
    pub end_date: Option<String>,
}

impl ListMealsQuery {
    /// Parse both bounds, rejecting malformed dates
    ///
    /// # Errors
    ///
    /// Returns a validation error if either date fails to parse.
    pub fn window(&self) -> AppResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        Ok((
            parse_date_param("startDate", self.start_date.as_deref())?,
            parse_date_param("endDate", self.end_date.as_deref())?,
        ))
    }
}

/// Meal routes handler
pub struct MealsRoutes;

impl MealsRoutes {
    /// Create all meal routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/meals", get(Self::handle_list))
            .route("/api/meals", post(Self::handle_create))
            .route("/api/meals/:id", get(Self::handle_get))
            .route("/api/meals/:id", put(Self::handle_update))
            .route("/api/meals/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle GET /api/meals - List meals, optionally within a date window
    async fn handle_list(
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
        Ok((StatusCode::OK, Json(ApiResponse::new(meals))).into_response())
    }

    /// Handle POST /api/meals - Log a meal
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateMealRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let body = require_json(body)?;
        let meal = resources.database.meals().create(auth.user_id, &body).await?;
        Ok((StatusCode::CREATED, Json(ApiResponse::new(meal))).into_response())
    }

    /// Handle GET /api/meals/:id - Get one meal
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let id = parse_meal_id(&id)?;
        let meal = resources
            .database
            .meals()
            .get(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Meal {id}")))?;
        Ok((StatusCode::OK, Json(ApiResponse::new(meal))).into_response())
    }

    /// Handle PUT /api/meals/:id - Partially update a meal
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Result<Json<UpdateMealRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let body = require_json(body)?;
        let id = parse_meal_id(&id)?;
        let meal = resources
            .database
            .meals()
            .update(id, auth.user_id, &body)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Meal {id}")))?;
        Ok((StatusCode::OK, Json(ApiResponse::new(meal))).into_response())
    }

    /// Handle DELETE /api/meals/:id - Delete a meal
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let id = parse_meal_id(&id)?;
        let deleted = resources.database.meals().delete(id, auth.user_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Meal {id}")));
        }
        let response = DeletedResponse { deleted: true };
        Ok((StatusCode::OK, Json(ApiResponse::new(response))).into_response())
    }
}

/// Parse a path id; a malformed id addresses a meal that cannot exist
fn parse_meal_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(format!("Meal {raw}")))
}

/// Parse an optional `YYYY-MM-DD` query parameter
pub(crate) fn parse_date_param(name: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    value
        .map(|raw| {
            raw.parse::<NaiveDate>()
                .map_err(|_| AppError::invalid_input(format!("Invalid {name}: {raw}")))
        })
        .transpose()
}
