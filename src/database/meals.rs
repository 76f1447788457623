// ABOUTME: Database operations for logged meals with owner scoping
// ABOUTME: Handles CRUD, date-window listing, and attaching the referenced recipe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

use crate::database::double_option;
use crate::database::recipes::{parse_timestamp, parse_uuid, Recipe, RecipesManager};
use crate::errors::{AppError, AppResult, ErrorCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Meal category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    /// Parse from string representation; unknown values are rejected
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }
}

/// A logged meal: either a recipe reference or a free-form food name
///
/// The read model carries the resolved `recipe` when the reference still
/// points at one of the owner's recipes; a dangling reference resolves to
/// `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Calendar date (no time-of-day significance)
    pub date: NaiveDate,
    /// Meal category
    pub meal_type: MealType,
    /// Reference to one of the owner's recipes
    pub recipe_id: Option<Uuid>,
    /// Resolved recipe, attached on read
    pub recipe: Option<Recipe>,
    /// Free-form food name for meals without a recipe
    pub custom_food_name: Option<String>,
    /// Portion multiplier applied to recipe quantities; > 0, 1.0 = one serving
    pub portion: f64,
    /// Optional free-text notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Request to log a new meal
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub custom_food_name: Option<String>,
    #[serde(default = "default_portion")]
    pub portion: f64,
    pub notes: Option<String>,
}

const fn default_portion() -> f64 {
    1.0
}

/// Request to update a logged meal
///
/// Same partial-update contract as recipes: absent fields keep their stored
/// value, explicit nulls clear nullable fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealRequest {
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    #[serde(default, deserialize_with = "double_option")]
    pub recipe_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub custom_food_name: Option<Option<String>>,
    pub portion: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Meal database operations manager
pub struct MealsManager {
    pool: SqlitePool,
    recipes: RecipesManager,
}

impl MealsManager {
    /// Create a new meals manager
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let recipes = RecipesManager::new(pool.clone());
        Self { pool, recipes }
    }

    /// Log a new meal
    ///
    /// A supplied recipe reference must resolve within the owner's recipe
    /// set. Returns the freshly-read record with its recipe attached.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid fields, or a database error if
    /// a statement fails.
    pub async fn create(&self, user_id: Uuid, request: &CreateMealRequest) -> AppResult<Meal> {
        validate_source(
            request.recipe_id.as_ref(),
            request.custom_food_name.as_deref(),
        )?;
        validate_portion(request.portion)?;
        if let Some(recipe_id) = request.recipe_id {
            self.require_owned_recipe(recipe_id, user_id).await?;
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO meals (
                id, user_id, date, meal_type, recipe_id, custom_food_name,
                portion, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(request.date.to_string())
        .bind(request.meal_type.as_str())
        .bind(request.recipe_id.map(|r| r.to_string()))
        .bind(&request.custom_food_name)
        .bind(request.portion)
        .bind(&request.notes)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create meal: {e}")))?;

        self.get(id, user_id)
            .await?
            .ok_or_else(|| AppError::internal("Created meal missing on re-read"))
    }

    /// List meals for a user within an optional inclusive date window
    ///
    /// Ordered by date descending, then creation time descending. Each meal
    /// carries its resolved recipe when the lookup succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list(
        &self,
        user_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<Meal>> {
        let rows = match (start_date, end_date) {
            (Some(start), Some(end)) => {
                sqlx::query(
                    r"
                    SELECT * FROM meals
                    WHERE user_id = $1 AND date >= $2 AND date <= $3
                    ORDER BY date DESC, created_at DESC
                    ",
                )
                .bind(user_id.to_string())
                .bind(start.to_string())
                .bind(end.to_string())
                .fetch_all(&self.pool)
                .await
            }
            (Some(start), None) => {
                sqlx::query(
                    r"
                    SELECT * FROM meals
                    WHERE user_id = $1 AND date >= $2
                    ORDER BY date DESC, created_at DESC
                    ",
                )
                .bind(user_id.to_string())
                .bind(start.to_string())
                .fetch_all(&self.pool)
                .await
            }
            (None, Some(end)) => {
                sqlx::query(
                    r"
                    SELECT * FROM meals
                    WHERE user_id = $1 AND date <= $2
                    ORDER BY date DESC, created_at DESC
                    ",
                )
                .bind(user_id.to_string())
                .bind(end.to_string())
                .fetch_all(&self.pool)
                .await
            }
            (None, None) => {
                sqlx::query(
                    r"
                    SELECT * FROM meals
                    WHERE user_id = $1
                    ORDER BY date DESC, created_at DESC
                    ",
                )
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to list meals: {e}")))?;

        let mut meals = Vec::with_capacity(rows.len());
        for row in &rows {
            meals.push(self.row_to_meal_with_recipe(row, user_id).await?);
        }
        Ok(meals)
    }

    /// Get a meal by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Meal>> {
        let row = sqlx::query(
            r"
            SELECT * FROM meals
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get meal: {e}")))?;

        match row {
            Some(row) => Ok(Some(self.row_to_meal_with_recipe(&row, user_id).await?)),
            None => Ok(None),
        }
    }

    /// Update a meal, modifying only the fields present in the request
    ///
    /// The merged record must still satisfy the recipe-or-custom-name rule
    /// and carry a positive portion.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid fields, or a database error if
    /// a statement fails.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &UpdateMealRequest,
    ) -> AppResult<Option<Meal>> {
        let Some(existing) = self.get(id, user_id).await? else {
            return Ok(None);
        };

        let date = request.date.unwrap_or(existing.date);
        let meal_type = request.meal_type.unwrap_or(existing.meal_type);
        let recipe_id = match &request.recipe_id {
            Some(value) => *value,
            None => existing.recipe_id,
        };
        let custom_food_name = match &request.custom_food_name {
            Some(value) => value.clone(),
            None => existing.custom_food_name,
        };
        let portion = request.portion.unwrap_or(existing.portion);
        let notes = match &request.notes {
            Some(value) => value.clone(),
            None => existing.notes,
        };

        validate_source(recipe_id.as_ref(), custom_food_name.as_deref())?;
        validate_portion(portion)?;
        // Re-check only references the request introduced; a stored reference
        // may already dangle and stays valid to keep
        if let Some(Some(new_recipe_id)) = request.recipe_id {
            self.require_owned_recipe(new_recipe_id, user_id).await?;
        }

        let result = sqlx::query(
            r"
            UPDATE meals SET
                date = $1, meal_type = $2, recipe_id = $3,
                custom_food_name = $4, portion = $5, notes = $6
            WHERE id = $7 AND user_id = $8
            ",
        )
        .bind(date.to_string())
        .bind(meal_type.as_str())
        .bind(recipe_id.map(|r| r.to_string()))
        .bind(&custom_food_name)
        .bind(portion)
        .bind(&notes)
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update meal: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id, user_id).await
    }

    /// Delete a meal
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM meals
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete meal: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Verify a recipe reference resolves within the owner's set
    async fn require_owned_recipe(&self, recipe_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if self.recipes.get(recipe_id, user_id).await?.is_none() {
            return Err(AppError::invalid_input(format!(
                "Recipe {recipe_id} does not exist"
            )));
        }
        Ok(())
    }

    /// Map a row to a `Meal`, attaching the referenced recipe when it still
    /// resolves in the owner's set
    async fn row_to_meal_with_recipe(&self, row: &SqliteRow, user_id: Uuid) -> AppResult<Meal> {
        let mut meal = row_to_meal(row)?;
        if let Some(recipe_id) = meal.recipe_id {
            meal.recipe = self.recipes.get(recipe_id, user_id).await?;
        }
        Ok(meal)
    }
}

/// Validate the recipe-or-custom-name rule: exactly one source populated
fn validate_source(recipe_id: Option<&Uuid>, custom_food_name: Option<&str>) -> AppResult<()> {
    match (recipe_id, custom_food_name) {
        (Some(_), Some(_)) => Err(AppError::invalid_input(
            "A meal takes either a recipe or a custom food name, not both",
        )),
        (None, None) => Err(AppError::new(
            ErrorCode::MissingRequiredField,
            "A meal requires a recipe or a custom food name",
        )),
        (None, Some(name)) if name.trim().is_empty() => Err(AppError::new(
            ErrorCode::MissingRequiredField,
            "Custom food name must be non-empty",
        )),
        _ => Ok(()),
    }
}

/// Validate the portion multiplier
fn validate_portion(portion: f64) -> AppResult<()> {
    if portion > 0.0 && portion.is_finite() {
        Ok(())
    } else {
        Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            "Portion must be a positive number",
        ))
    }
}

/// Convert a database row to a `Meal` (recipe attached separately)
fn row_to_meal(row: &SqliteRow) -> AppResult<Meal> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let date_str: String = row.get("date");
    let meal_type_str: String = row.get("meal_type");
    let recipe_id_str: Option<String> = row.get("recipe_id");
    let created_at_str: String = row.get("created_at");

    let recipe_id = recipe_id_str.as_deref().map(parse_uuid).transpose()?;
    let meal_type = MealType::parse(&meal_type_str)
        .ok_or_else(|| AppError::internal(format!("Invalid meal type: {meal_type_str}")))?;
    let date: NaiveDate = date_str
        .parse()
        .map_err(|e| AppError::internal(format!("Invalid date: {e}")))?;

    Ok(Meal {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        date,
        meal_type,
        recipe_id,
        recipe: None,
        custom_food_name: row.get("custom_food_name"),
        portion: row.get("portion"),
        notes: row.get("notes"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_parse_rejects_unknown() {
        assert_eq!(MealType::parse("dinner"), Some(MealType::Dinner));
        assert_eq!(MealType::parse("brunch"), None);
    }

    #[test]
    fn test_source_rule() {
        let recipe_id = Uuid::new_v4();
        assert!(validate_source(Some(&recipe_id), None).is_ok());
        assert!(validate_source(None, Some("toast")).is_ok());
        assert!(validate_source(Some(&recipe_id), Some("toast")).is_err());
        assert!(validate_source(None, None).is_err());
        assert!(validate_source(None, Some("  ")).is_err());
    }

    #[test]
    fn test_portion_must_be_positive() {
        assert!(validate_portion(0.5).is_ok());
        assert!(validate_portion(0.0).is_err());
        assert!(validate_portion(-1.0).is_err());
        assert!(validate_portion(f64::NAN).is_err());
    }

    #[test]
    fn test_wire_roundtrip_preserves_source() {
        let meal = Meal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: "2026-03-14".parse().unwrap(),
            meal_type: MealType::Lunch,
            recipe_id: None,
            recipe: None,
            custom_food_name: Some("leftover stew".to_owned()),
            portion: 1.5,
            notes: Some("extra bread".to_owned()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&meal).unwrap();
        let back: Meal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date, meal.date);
        assert_eq!(back.meal_type, meal.meal_type);
        assert!((back.portion - 1.5).abs() < f64::EPSILON);
        assert_eq!(back.custom_food_name, meal.custom_food_name);
        assert_eq!(back.recipe_id, None);
        assert_eq!(back.notes, meal.notes);
    }
}
