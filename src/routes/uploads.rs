// ABOUTME: Route handlers for image upload and serving
// ABOUTME: Multipart upload with type/size checks, immutable cached image reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Upload routes
//!
//! `POST /api/upload` accepts one multipart `image` field, validates type and
//! size, and stores it under a server-generated key. `GET /api/images/:name`
//! serves stored objects without authentication; keys are unguessable UUIDs
//! and responses are immutable, so clients may cache them forever.

use crate::errors::AppError;
use crate::routes::ApiResponse;
use crate::server::ServerResources;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response for a successful upload
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Path the stored image is served under
    pub image_url: String,
}

/// Upload routes handler
pub struct UploadRoutes;

impl UploadRoutes {
    /// Create the upload and image-serving routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/upload", post(Self::handle_upload))
            .route("/api/images/:name", get(Self::handle_get_image))
            .with_state(resources)
    }

    /// Handle POST /api/upload - Store an uploaded image
    async fn handle_upload(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate_request(&headers).await?;

        let mut stored_key = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::invalid_input(format!("Malformed multipart body: {e}")))?
        {
            if field.name() != Some("image") {
                continue;
            }

            let content_type = field
                .content_type()
                .ok_or_else(|| AppError::invalid_input("Image field has no content type"))?
                .to_owned();
            if !content_type.starts_with("image/") {
                return Err(AppError::invalid_input(format!(
                    "Expected an image upload, got {content_type}"
                )));
            }

            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid_input(format!("Failed to read upload: {e}")))?;
            if bytes.len() > resources.config.uploads.max_bytes {
                return Err(AppError::invalid_input(format!(
                    "Image exceeds the {} byte limit",
                    resources.config.uploads.max_bytes
                )));
            }

            stored_key = Some(resources.object_store.put(bytes, &content_type).await?);
            break;
        }

        let key = stored_key.ok_or_else(|| {
            AppError::new(
                crate::errors::ErrorCode::MissingRequiredField,
                "Multipart field 'image' is required",
            )
        })?;

        let response = UploadResponse {
            image_url: format!("/api/images/{key}"),
        };
        Ok((StatusCode::OK, Json(ApiResponse::new(response))).into_response())
    }

    /// Handle GET /api/images/:name - Serve a stored image
    async fn handle_get_image(
        State(resources): State<Arc<ServerResources>>,
        Path(name): Path<String>,
    ) -> Result<Response, AppError> {
        let object = resources
            .object_store
            .get(&name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Image {name}")))?;

        Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, object.content_type),
                (
                    header::CACHE_CONTROL,
                    "public, max-age=31536000, immutable".to_owned(),
                ),
            ],
            object.bytes,
        )
            .into_response())
    }
}
