// ABOUTME: Aggregation engine computing derived meal statistics
// ABOUTME: Favorites, meal-type distribution, weighted ingredients, nutrition trend points
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Derived statistics over one owner's meal set.
//!
//! [`aggregate`] is a pure, single-pass function: the HTTP layer fetches the
//! meal window through the persistence layer and feeds it in. Nothing here is
//! cached across requests; analytics are recomputed on demand.

use crate::database::meals::{Meal, MealType};
use crate::database::recipes::Recipe;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ranked lists are truncated to this many entries
const TOP_N: usize = 10;

/// One entry of the favorite-recipes ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeUsage {
    /// The resolved recipe
    pub recipe: Recipe,
    /// How many meals referenced it (count, not portion-weighted)
    pub count: usize,
}

/// One entry of the ingredient-frequency ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientFrequency {
    /// Ingredient name
    pub ingredient: String,
    /// Sum of portion multipliers over every meal using the ingredient
    pub frequency: f64,
}

/// One nutrition time-series point: a single meal scaled by its portion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionPoint {
    /// Meal date
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

/// Derived statistics for one owner over a meal window
///
/// Never persisted; recomputed on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalytics {
    /// Count of meals in the window
    pub total_meals: usize,
    /// Top recipes by usage count, descending
    pub favorite_recipes: Vec<RecipeUsage>,
    /// Meal count per category
    pub meals_by_type: BTreeMap<MealType, usize>,
    /// Top ingredients by portion-weighted frequency, descending
    pub top_ingredients: Vec<IngredientFrequency>,
    /// Per-meal nutrition points, ascending by date for charting
    pub nutrition_trends: Vec<NutritionPoint>,
}

/// Compute analytics over a fetched meal set
///
/// A meal with an unresolved recipe reference counts toward `total_meals`
/// and `meals_by_type` (its category is stored independently of the link)
/// but contributes nothing to favorites, ingredients, or trends.
///
/// Ties in the ranked lists keep first-appearance order; the input order is
/// deterministic (date descending, then creation time descending), so the
/// output is too.
#[must_use]
pub fn aggregate(meals: &[Meal]) -> MealAnalytics {
    let mut recipe_counts: Vec<(Recipe, usize)> = Vec::new();
    let mut meals_by_type: BTreeMap<MealType, usize> = BTreeMap::new();
    let mut ingredient_weights: Vec<(String, f64)> = Vec::new();
    let mut points: Vec<(NaiveDate, DateTime<Utc>, NutritionPoint)> = Vec::new();

    for meal in meals {
        *meals_by_type.entry(meal.meal_type).or_insert(0) += 1;

        let Some(recipe) = &meal.recipe else {
            continue;
        };

        match recipe_counts.iter_mut().find(|(r, _)| r.id == recipe.id) {
            Some((_, count)) => *count += 1,
            None => recipe_counts.push((recipe.clone(), 1)),
        }

        for ingredient in &recipe.ingredients {
            match ingredient_weights
                .iter_mut()
                .find(|(name, _)| *name == ingredient.name)
            {
                Some((_, weight)) => *weight += meal.portion,
                None => ingredient_weights.push((ingredient.name.clone(), meal.portion)),
            }
        }

        if let Some(nutrition) = &recipe.nutrition {
            points.push((
                meal.date,
                meal.created_at,
                NutritionPoint {
                    date: meal.date,
                    calories: nutrition.calories.unwrap_or(0.0) * meal.portion,
                    protein: nutrition.protein.unwrap_or(0.0) * meal.portion,
                    carbs: nutrition.carbs.unwrap_or(0.0) * meal.portion,
                    fat: nutrition.fat.unwrap_or(0.0) * meal.portion,
                    fiber: nutrition.fiber.unwrap_or(0.0) * meal.portion,
                },
            ));
        }
    }

    // Stable sorts keep first-appearance order on ties
    recipe_counts.sort_by(|a, b| b.1.cmp(&a.1));
    recipe_counts.truncate(TOP_N);

    ingredient_weights.sort_by(|a, b| b.1.total_cmp(&a.1));
    ingredient_weights.truncate(TOP_N);

    points.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    MealAnalytics {
        total_meals: meals.len(),
        favorite_recipes: recipe_counts
            .into_iter()
            .map(|(recipe, count)| RecipeUsage { recipe, count })
            .collect(),
        meals_by_type,
        top_ingredients: ingredient_weights
            .into_iter()
            .map(|(ingredient, frequency)| IngredientFrequency {
                ingredient,
                frequency,
            })
            .collect(),
        nutrition_trends: points.into_iter().map(|(_, _, point)| point).collect(),
    }
}
