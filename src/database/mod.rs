// ABOUTME: Database module organization and connection management
// ABOUTME: Creates the SQLite pool, applies the schema, and exposes per-entity managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Persistence layer entry point.
//!
//! [`Database`] owns the `SQLite` pool and hands out the per-entity managers
//! ([`recipes::RecipesManager`], [`meals::MealsManager`]). The schema is
//! applied idempotently at startup.

/// Recipe and ingredient storage operations
pub mod recipes;

/// Meal storage operations and the meal-to-recipe read model
pub mod meals;

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Idempotent schema definition applied at startup
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS recipes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    image_url TEXT,
    is_public INTEGER NOT NULL DEFAULT 0,
    prep_time_minutes INTEGER,
    cook_time_minutes INTEGER,
    servings INTEGER,
    difficulty TEXT,
    category TEXT,
    instructions TEXT NOT NULL DEFAULT '[]',
    nutrition TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recipes_user_created ON recipes(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_recipes_public ON recipes(is_public);

CREATE TABLE IF NOT EXISTS ingredients (
    id TEXT PRIMARY KEY,
    recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    amount REAL NOT NULL,
    unit TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id);

-- meals.recipe_id carries no foreign key: deleting a recipe leaves the
-- reference dangling and reads resolve it to null
CREATE TABLE IF NOT EXISTS meals (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    meal_type TEXT NOT NULL,
    recipe_id TEXT,
    custom_food_name TEXT,
    portion REAL NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_meals_user_date ON meals(user_id, date);
";

/// Connection manager over the `SQLite` pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and apply the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the pool cannot connect, or
    /// the schema fails to apply.
    pub async fn new(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect: {e}")))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;

        tracing::info!(url = %url, "database ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests over in-memory databases)
    ///
    /// # Errors
    ///
    /// Returns an error if the schema fails to apply.
    pub async fn from_pool(pool: SqlitePool) -> AppResult<Self> {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        Ok(Self { pool })
    }

    /// Recipe storage operations
    #[must_use]
    pub fn recipes(&self) -> recipes::RecipesManager {
        recipes::RecipesManager::new(self.pool.clone())
    }

    /// Meal storage operations
    #[must_use]
    pub fn meals(&self) -> meals::MealsManager {
        meals::MealsManager::new(self.pool.clone())
    }

    /// Access the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Deserialize helper distinguishing an absent field from an explicit null.
///
/// With `#[serde(default, deserialize_with = "double_option")]` a missing
/// field stays `None`, `null` becomes `Some(None)`, and a value becomes
/// `Some(Some(v))` — the partial-update contract depends on this.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
