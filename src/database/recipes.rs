// ABOUTME: Database operations for user-owned recipes and their ingredients
// ABOUTME: Handles CRUD with owner scoping, public reads, and the import operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

use crate::database::double_option;
use crate::errors::{AppError, AppResult, ErrorCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Recipe difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse from string representation; unknown values are rejected
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Per-serving nutrition snapshot; every macro is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
}

impl NutritionInfo {
    /// Whether all macro values are non-negative
    fn is_valid(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat, self.fiber]
            .iter()
            .flatten()
            .all(|v| *v >= 0.0)
    }
}

/// An ingredient owned by exactly one recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique identifier
    pub id: Uuid,
    /// Ingredient name
    pub name: String,
    /// Quantity in the given unit, >= 0
    pub amount: f64,
    /// Unit string (free text: "g", "cups", ...)
    pub unit: String,
}

/// A recipe with its owned ingredient list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional image reference (served under /api/images)
    pub image_url: Option<String>,
    /// Whether the recipe is visible on the public endpoints
    pub is_public: bool,
    /// Preparation time in minutes
    pub prep_time_minutes: Option<u32>,
    /// Cooking time in minutes
    pub cook_time_minutes: Option<u32>,
    /// Number of servings the recipe yields
    pub servings: Option<u32>,
    /// Difficulty level
    pub difficulty: Option<Difficulty>,
    /// Free-text category
    pub category: Option<String>,
    /// Ordered instruction steps (stored as a JSON array)
    pub instructions: Vec<String>,
    /// Owned ingredient list
    pub ingredients: Vec<Ingredient>,
    /// Per-serving nutrition snapshot
    pub nutrition: Option<NutritionInfo>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Ingredient fields supplied by clients (ids are assigned on write)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Request to create a new recipe
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    /// Display name (required, non-empty)
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    pub nutrition: Option<NutritionInfo>,
}

/// Request to update an existing recipe
///
/// Plain `Option` fields cannot be cleared, only replaced. Double-`Option`
/// fields distinguish "absent" (keep stored value) from "explicit null"
/// (clear the stored value).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    pub is_public: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub prep_time_minutes: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cook_time_minutes: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub servings: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub difficulty: Option<Option<Difficulty>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub instructions: Option<Vec<String>>,
    /// When present, replaces the owned ingredient set wholesale
    pub ingredients: Option<Vec<IngredientInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nutrition: Option<Option<NutritionInfo>>,
}

/// Recipe database operations manager
pub struct RecipesManager {
    pool: SqlitePool,
}

impl RecipesManager {
    /// Create a new recipes manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new recipe with its ingredients
    ///
    /// Returns the freshly-read record so the response reflects exactly what
    /// was stored.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid fields, or a database error if
    /// a statement fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        request: &CreateRecipeRequest,
    ) -> AppResult<Recipe> {
        validate_create(request)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let instructions_json = serde_json::to_string(&request.instructions)?;
        let nutrition_json = request
            .nutrition
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO recipes (
                id, user_id, name, description, image_url, is_public,
                prep_time_minutes, cook_time_minutes, servings, difficulty,
                category, instructions, nutrition, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(i64::from(request.is_public))
        .bind(request.prep_time_minutes.map(i64::from))
        .bind(request.cook_time_minutes.map(i64::from))
        .bind(request.servings.map(i64::from))
        .bind(request.difficulty.map(Difficulty::as_str))
        .bind(&request.category)
        .bind(&instructions_json)
        .bind(&nutrition_json)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create recipe: {e}")))?;

        self.replace_ingredients(id, &request.ingredients).await?;

        self.get(id, user_id)
            .await?
            .ok_or_else(|| AppError::internal("Created recipe missing on re-read"))
    }

    /// List all recipes owned by a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM recipes
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list recipes: {e}")))?;

        self.attach_ingredients(rows).await
    }

    /// Get a recipe by id, scoped to its owner
    ///
    /// A recipe owned by another user is indistinguishable from nonexistent.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(
            r"
            SELECT * FROM recipes
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        match row {
            Some(row) => {
                let mut recipe = row_to_recipe(&row)?;
                recipe.ingredients = self.load_ingredients(recipe.id).await?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    /// Update a recipe, modifying only the fields present in the request
    ///
    /// Absent fields keep their stored value; explicit nulls clear nullable
    /// fields. `updated_at` always advances on a successful update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid fields, or a database error if
    /// a statement fails.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &UpdateRecipeRequest,
    ) -> AppResult<Option<Recipe>> {
        let Some(existing) = self.get(id, user_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let name = match &request.name {
            Some(name) => name.trim(),
            None => existing.name.as_str(),
        };
        let description = merge(&request.description, &existing.description);
        let image_url = merge(&request.image_url, &existing.image_url);
        let is_public = request.is_public.unwrap_or(existing.is_public);
        let prep = merge(&request.prep_time_minutes, &existing.prep_time_minutes);
        let cook = merge(&request.cook_time_minutes, &existing.cook_time_minutes);
        let servings = merge(&request.servings, &existing.servings);
        let difficulty = merge(&request.difficulty, &existing.difficulty);
        let category = merge(&request.category, &existing.category);
        let instructions = request
            .instructions
            .as_ref()
            .unwrap_or(&existing.instructions);
        let nutrition = merge(&request.nutrition, &existing.nutrition);

        validate_fields(name, servings, &nutrition, instructions)?;
        if let Some(ingredients) = &request.ingredients {
            validate_ingredients(ingredients)?;
        }

        let instructions_json = serde_json::to_string(instructions)?;
        let nutrition_json = nutrition.as_ref().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r"
            UPDATE recipes SET
                name = $1, description = $2, image_url = $3, is_public = $4,
                prep_time_minutes = $5, cook_time_minutes = $6, servings = $7,
                difficulty = $8, category = $9, instructions = $10,
                nutrition = $11, updated_at = $12
            WHERE id = $13 AND user_id = $14
            ",
        )
        .bind(name)
        .bind(&description)
        .bind(&image_url)
        .bind(i64::from(is_public))
        .bind(prep.map(i64::from))
        .bind(cook.map(i64::from))
        .bind(servings.map(i64::from))
        .bind(difficulty.map(Difficulty::as_str))
        .bind(&category)
        .bind(&instructions_json)
        .bind(&nutrition_json)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update recipe: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(ingredients) = &request.ingredients {
            self.replace_ingredients(id, ingredients).await?;
        }

        self.get(id, user_id).await
    }

    /// Delete a recipe and its owned ingredients
    ///
    /// Meals referencing the recipe keep their reference; it resolves to
    /// null from then on.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM recipes
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete recipe: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// List all public recipes, newest first (unscoped)
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list_public(&self) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM recipes
            WHERE is_public = 1
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list public recipes: {e}")))?;

        self.attach_ingredients(rows).await
    }

    /// Get a public recipe by id (unscoped, public only)
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn get_public(&self, id: Uuid) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(
            r"
            SELECT * FROM recipes
            WHERE id = $1 AND is_public = 1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get public recipe: {e}")))?;

        match row {
            Some(row) => {
                let mut recipe = row_to_recipe(&row)?;
                recipe.ingredients = self.load_ingredients(recipe.id).await?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    /// Clone a public recipe into the importing user's private set
    ///
    /// Copies name, description, and image only. The clone gets a new id,
    /// fresh timestamps, and no link back to the source. Returns `None` when
    /// the source is missing or not public.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn import_public(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Recipe>> {
        let Some(source) = self.get_public(id).await? else {
            return Ok(None);
        };

        let request = CreateRecipeRequest {
            name: source.name,
            description: source.description,
            image_url: source.image_url,
            is_public: false,
            ..Default::default()
        };
        let imported = self.create(user_id, &request).await?;
        tracing::debug!(source = %id, clone = %imported.id, "imported public recipe");
        Ok(Some(imported))
    }

    /// Load the owned ingredient rows for a recipe
    async fn load_ingredients(&self, recipe_id: Uuid) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, amount, unit FROM ingredients
            WHERE recipe_id = $1
            ORDER BY rowid
            ",
        )
        .bind(recipe_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load ingredients: {e}")))?;

        rows.iter().map(row_to_ingredient).collect()
    }

    /// Replace a recipe's owned ingredient set wholesale
    async fn replace_ingredients(
        &self,
        recipe_id: Uuid,
        ingredients: &[IngredientInput],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM ingredients WHERE recipe_id = $1")
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear ingredients: {e}")))?;

        for ingredient in ingredients {
            sqlx::query(
                r"
                INSERT INTO ingredients (id, recipe_id, name, amount, unit)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id.to_string())
            .bind(&ingredient.name)
            .bind(ingredient.amount)
            .bind(&ingredient.unit)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to insert ingredient: {e}")))?;
        }

        Ok(())
    }

    /// Map rows to recipes and attach their ingredient lists
    async fn attach_ingredients(&self, rows: Vec<SqliteRow>) -> AppResult<Vec<Recipe>> {
        let mut recipes = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut recipe = row_to_recipe(row)?;
            recipe.ingredients = self.load_ingredients(recipe.id).await?;
            recipes.push(recipe);
        }
        Ok(recipes)
    }
}

/// Validate a create request
fn validate_create(request: &CreateRecipeRequest) -> AppResult<()> {
    if request.name.trim().is_empty() {
        return Err(AppError::new(
            ErrorCode::MissingRequiredField,
            "Recipe name is required",
        ));
    }
    validate_fields(
        request.name.trim(),
        request.servings,
        &request.nutrition,
        &request.instructions,
    )?;
    validate_ingredients(&request.ingredients)
}

/// Shared field validation for create and merged-update states
fn validate_fields(
    name: &str,
    servings: Option<u32>,
    nutrition: &Option<NutritionInfo>,
    instructions: &[String],
) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::new(
            ErrorCode::MissingRequiredField,
            "Recipe name is required",
        ));
    }
    if servings == Some(0) {
        return Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            "Servings must be positive",
        ));
    }
    if let Some(nutrition) = nutrition {
        if !nutrition.is_valid() {
            return Err(AppError::new(
                ErrorCode::ValueOutOfRange,
                "Nutrition values must be non-negative",
            ));
        }
    }
    if instructions.iter().any(|step| step.trim().is_empty()) {
        return Err(AppError::invalid_input("Instruction steps must be non-empty"));
    }
    Ok(())
}

/// Validate ingredient inputs
fn validate_ingredients(ingredients: &[IngredientInput]) -> AppResult<()> {
    for ingredient in ingredients {
        if ingredient.name.trim().is_empty() {
            return Err(AppError::new(
                ErrorCode::MissingRequiredField,
                "Ingredient name is required",
            ));
        }
        if ingredient.amount < 0.0 {
            return Err(AppError::new(
                ErrorCode::ValueOutOfRange,
                "Ingredient amount must be non-negative",
            ));
        }
    }
    Ok(())
}

/// Resolve a double-`Option` update field against the stored value
fn merge<T: Clone>(patch: &Option<Option<T>>, existing: &Option<T>) -> Option<T> {
    match patch {
        Some(value) => value.clone(),
        None => existing.clone(),
    }
}

/// Convert a database row to a `Recipe` (ingredients attached separately)
fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let is_public: i64 = row.get("is_public");
    let prep: Option<i64> = row.get("prep_time_minutes");
    let cook: Option<i64> = row.get("cook_time_minutes");
    let servings: Option<i64> = row.get("servings");
    let difficulty_str: Option<String> = row.get("difficulty");
    let instructions_json: String = row.get("instructions");
    let nutrition_json: Option<String> = row.get("nutrition");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    let difficulty = match difficulty_str {
        Some(s) => Some(
            Difficulty::parse(&s)
                .ok_or_else(|| AppError::internal(format!("Invalid difficulty: {s}")))?,
        ),
        None => None,
    };
    let instructions: Vec<String> = serde_json::from_str(&instructions_json)?;
    let nutrition: Option<NutritionInfo> = nutrition_json
        .map(|json| serde_json::from_str(&json))
        .transpose()?;

    Ok(Recipe {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        name: row.get("name"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        is_public: is_public == 1,
        prep_time_minutes: to_u32(prep)?,
        cook_time_minutes: to_u32(cook)?,
        servings: to_u32(servings)?,
        difficulty,
        category: row.get("category"),
        instructions,
        ingredients: Vec::new(),
        nutrition,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

/// Convert a database row to an `Ingredient`
fn row_to_ingredient(row: &SqliteRow) -> AppResult<Ingredient> {
    let id_str: String = row.get("id");
    Ok(Ingredient {
        id: parse_uuid(&id_str)?,
        name: row.get("name"),
        amount: row.get("amount"),
        unit: row.get("unit"),
    })
}

pub(crate) fn parse_uuid(s: &str) -> AppResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))
}

pub(crate) fn parse_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_u32(value: Option<i64>) -> AppResult<Option<u32>> {
    value
        .map(|v| u32::try_from(v).map_err(|_| AppError::internal("Value out of range")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse_rejects_unknown() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("impossible"), None);
        assert_eq!(Difficulty::parse("EASY"), None);
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let absent: UpdateRecipeRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.description.is_none());

        let null: UpdateRecipeRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(null.description, Some(None));

        let value: UpdateRecipeRequest =
            serde_json::from_str(r#"{"description": "toast"}"#).unwrap();
        assert_eq!(value.description, Some(Some("toast".to_owned())));
    }

    #[test]
    fn test_validate_create_requires_name() {
        let request = CreateRecipeRequest {
            name: "   ".to_owned(),
            ..Default::default()
        };
        let err = validate_create(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn test_validate_negative_nutrition() {
        let request = CreateRecipeRequest {
            name: "Soup".to_owned(),
            nutrition: Some(NutritionInfo {
                calories: Some(-5.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = validate_create(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_merge_semantics() {
        let stored = Some("old".to_owned());
        assert_eq!(merge(&None, &stored), Some("old".to_owned()));
        assert_eq!(merge(&Some(None), &stored), None);
        assert_eq!(
            merge(&Some(Some("new".to_owned())), &stored),
            Some("new".to_owned())
        );
    }
}
