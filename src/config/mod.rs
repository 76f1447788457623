// ABOUTME: Configuration module for the Mealtrack server
// ABOUTME: Environment-based configuration loading and validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

/// Environment-variable based server configuration
pub mod environment;

pub use environment::{AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, UploadConfig};
