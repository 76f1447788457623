// ABOUTME: Library root for the Mealtrack recipe and meal tracking server
// ABOUTME: Organizes persistence, aggregation, auth, storage, and HTTP route modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! # Mealtrack Server
//!
//! A personal recipe and meal tracking API: users maintain a private recipe
//! collection, log meals against recipes or free-text foods, and query
//! aggregated statistics over their meal history. A shared public catalog
//! lets users browse and import each other's published recipes.
//!
//! The crate splits into three layers: the persistence managers in
//! [`database`], the pure aggregation in [`analytics`], and the HTTP surface
//! in [`routes`]. Authentication is delegated to an external identity
//! service via [`auth`]; uploaded images live behind the [`storage`] seam.

/// Meal statistics aggregation
pub mod analytics;
/// Request authentication against the identity service
pub mod auth;
/// Environment-based configuration
pub mod config;
/// `SQLite` persistence managers
pub mod database;
/// Unified error types and HTTP mapping
pub mod errors;
/// Structured logging setup
pub mod logging;
/// HTTP route handlers and the response envelope
pub mod routes;
/// Server resources and the HTTP entry point
pub mod server;
/// Blob storage for uploaded images
pub mod storage;
