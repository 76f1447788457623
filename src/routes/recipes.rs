// ABOUTME: Route handlers for the recipes REST API
// ABOUTME: Owner-scoped CRUD plus the public catalog and import endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Recipe routes
//!
//! All `/api/recipes` endpoints authenticate first and operate only on the
//! caller's rows. The `/api/public/recipes` reads take no credentials at
//! all (the shared catalog is world-readable); import authenticates because
//! it copies the recipe into the caller's private collection.

use crate::database::recipes::{CreateRecipeRequest, Recipe, UpdateRecipeRequest};
use crate::errors::{AppError, AppResult};
use crate::routes::{require_json, ApiResponse};
use crate::server::ServerResources;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Response for a delete operation
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    /// Whether a row was removed
    pub deleted: bool,
}

/// Recipe routes handler
pub struct RecipesRoutes;

impl RecipesRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/recipes", get(Self::handle_list))
            .route("/api/recipes", post(Self::handle_create))
            .route("/api/recipes/:id", get(Self::handle_get))
            .route("/api/recipes/:id", put(Self::handle_update))
            .route("/api/recipes/:id", delete(Self::handle_delete))
            .route("/api/public/recipes", get(Self::handle_list_public))
            .route("/api/public/recipes/:id", get(Self::handle_get_public))
            .route(
                "/api/public/recipes/:id/import",
                post(Self::handle_import_public),
            )
            .with_state(resources)
    }

    /// Handle GET /api/recipes - List the caller's recipes
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let recipes = resources.database.recipes().list(auth.user_id).await?;
        Ok((StatusCode::OK, Json(ApiResponse::new(recipes))).into_response())
    }

    /// Handle POST /api/recipes - Create a recipe
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateRecipeRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let body = require_json(body)?;
        let recipe = resources
            .database
            .recipes()
            .create(auth.user_id, &body)
            .await?;
        Ok((StatusCode::CREATED, Json(ApiResponse::new(recipe))).into_response())
    }

    /// Handle GET /api/recipes/:id - Get one of the caller's recipes
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let id = parse_recipe_id(&id)?;
        let recipe = resources
            .database
            .recipes()
            .get(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {id}")))?;
        Ok((StatusCode::OK, Json(ApiResponse::new(recipe))).into_response())
    }

    /// Handle PUT /api/recipes/:id - Partially update a recipe
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Result<Json<UpdateRecipeRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let body = require_json(body)?;
        let id = parse_recipe_id(&id)?;
        let recipe = resources
            .database
            .recipes()
            .update(id, auth.user_id, &body)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {id}")))?;
        Ok((StatusCode::OK, Json(ApiResponse::new(recipe))).into_response())
    }

    /// Handle DELETE /api/recipes/:id - Delete a recipe and its ingredients
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let id = parse_recipe_id(&id)?;
        let deleted = resources.database.recipes().delete(id, auth.user_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Recipe {id}")));
        }
        let response = DeletedResponse { deleted: true };
        Ok((StatusCode::OK, Json(ApiResponse::new(response))).into_response())
    }

    /// Handle GET /api/public/recipes - List the shared catalog (no auth)
    async fn handle_list_public(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let recipes: Vec<Recipe> = resources.database.recipes().list_public().await?;
        Ok((StatusCode::OK, Json(ApiResponse::new(recipes))).into_response())
    }

    /// Handle GET /api/public/recipes/:id - Get one public recipe (no auth)
    async fn handle_get_public(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = parse_recipe_id(&id)?;
        let recipe = resources
            .database
            .recipes()
            .get_public(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Public recipe {id}")))?;
        Ok((StatusCode::OK, Json(ApiResponse::new(recipe))).into_response())
    }

    /// Handle POST /api/public/recipes/:id/import - Copy a public recipe
    async fn handle_import_public(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers).await?;
        let id = parse_recipe_id(&id)?;
        let recipe = resources
            .database
            .recipes()
            .import_public(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Public recipe {id}")))?;
        Ok((StatusCode::CREATED, Json(ApiResponse::new(recipe))).into_response())
    }
}

/// Parse a path id; a malformed id addresses a recipe that cannot exist
fn parse_recipe_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(format!("Recipe {raw}")))
}
