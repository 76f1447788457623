// ABOUTME: Integration tests for meal persistence operations
// ABOUTME: Covers source validation, date windows, recipe resolution, and updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

mod common;

use anyhow::Result;
use common::{create_test_database, other_user_id, test_user_id};
use mealtrack::database::meals::{CreateMealRequest, MealType, UpdateMealRequest};
use mealtrack::database::recipes::CreateRecipeRequest;
use mealtrack::database::Database;
use mealtrack::errors::ErrorCode;
use uuid::Uuid;

fn custom_meal(date: &str, meal_type: MealType) -> CreateMealRequest {
    CreateMealRequest {
        date: date.parse().unwrap(),
        meal_type,
        recipe_id: None,
        custom_food_name: Some("leftovers".to_owned()),
        portion: 1.0,
        notes: None,
    }
}

async fn create_recipe(database: &Database, user: Uuid, name: &str) -> Result<Uuid> {
    let recipe = database
        .recipes()
        .create(
            user,
            &CreateRecipeRequest {
                name: name.to_owned(),
                ..CreateRecipeRequest::default()
            },
        )
        .await?;
    Ok(recipe.id)
}

#[tokio::test]
async fn test_create_resolves_recipe_reference() -> Result<()> {
    let database = create_test_database().await?;
    let recipe_id = create_recipe(&database, test_user_id(), "Pancakes").await?;

    let meal = database
        .meals()
        .create(
            test_user_id(),
            &CreateMealRequest {
                date: "2026-03-01".parse()?,
                meal_type: MealType::Breakfast,
                recipe_id: Some(recipe_id),
                custom_food_name: None,
                portion: 1.5,
                notes: Some("double batch".to_owned()),
            },
        )
        .await?;

    assert_eq!(meal.recipe_id, Some(recipe_id));
    let recipe = meal.recipe.unwrap();
    assert_eq!(recipe.name, "Pancakes");
    assert!((meal.portion - 1.5).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn test_create_requires_exactly_one_source() -> Result<()> {
    let database = create_test_database().await?;
    let recipe_id = create_recipe(&database, test_user_id(), "Pancakes").await?;
    let meals = database.meals();

    let mut both = custom_meal("2026-03-01", MealType::Lunch);
    both.recipe_id = Some(recipe_id);
    let err = meals.create(test_user_id(), &both).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let mut neither = custom_meal("2026-03-01", MealType::Lunch);
    neither.custom_food_name = None;
    let err = meals.create(test_user_id(), &neither).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
    Ok(())
}

#[tokio::test]
async fn test_create_rejects_foreign_recipe_reference() -> Result<()> {
    let database = create_test_database().await?;
    let foreign_recipe = create_recipe(&database, other_user_id(), "Theirs").await?;

    let mut request = custom_meal("2026-03-01", MealType::Dinner);
    request.custom_food_name = None;
    request.recipe_id = Some(foreign_recipe);
    let err = database
        .meals()
        .create(test_user_id(), &request)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    Ok(())
}

#[tokio::test]
async fn test_create_rejects_nonpositive_portion() -> Result<()> {
    let database = create_test_database().await?;
    let mut request = custom_meal("2026-03-01", MealType::Snack);
    request.portion = 0.0;
    let err = database
        .meals()
        .create(test_user_id(), &request)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    Ok(())
}

#[tokio::test]
async fn test_list_window_is_inclusive_and_newest_first() -> Result<()> {
    let database = create_test_database().await?;
    let meals = database.meals();

    for date in ["2026-03-01", "2026-03-02", "2026-03-03", "2026-03-05"] {
        meals
            .create(test_user_id(), &custom_meal(date, MealType::Lunch))
            .await?;
    }
    meals
        .create(other_user_id(), &custom_meal("2026-03-02", MealType::Lunch))
        .await?;

    let window = meals
        .list(
            test_user_id(),
            Some("2026-03-02".parse()?),
            Some("2026-03-03".parse()?),
        )
        .await?;
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].date, "2026-03-03".parse()?);
    assert_eq!(window[1].date, "2026-03-02".parse()?);

    let open_start = meals.list(test_user_id(), None, Some("2026-03-02".parse()?)).await?;
    assert_eq!(open_start.len(), 2);

    let all = meals.list(test_user_id(), None, None).await?;
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].date, "2026-03-05".parse()?);
    Ok(())
}

#[tokio::test]
async fn test_deleted_recipe_leaves_dangling_reference() -> Result<()> {
    let database = create_test_database().await?;
    let recipe_id = create_recipe(&database, test_user_id(), "Pancakes").await?;

    let mut request = custom_meal("2026-03-01", MealType::Breakfast);
    request.custom_food_name = None;
    request.recipe_id = Some(recipe_id);
    let meal = database.meals().create(test_user_id(), &request).await?;

    assert!(database.recipes().delete(recipe_id, test_user_id()).await?);

    let reread = database
        .meals()
        .get(meal.id, test_user_id())
        .await?
        .unwrap();
    // the stored reference survives; resolution yields nothing
    assert_eq!(reread.recipe_id, Some(recipe_id));
    assert!(reread.recipe.is_none());
    Ok(())
}

#[tokio::test]
async fn test_update_merges_and_clears_notes() -> Result<()> {
    let database = create_test_database().await?;
    let meals = database.meals();

    let mut request = custom_meal("2026-03-01", MealType::Lunch);
    request.notes = Some("rushed".to_owned());
    let meal = meals.create(test_user_id(), &request).await?;

    let patch: UpdateMealRequest = serde_json::from_value(serde_json::json!({
        "mealType": "dinner"
    }))?;
    let updated = meals
        .update(meal.id, test_user_id(), &patch)
        .await?
        .unwrap();
    assert_eq!(updated.meal_type, MealType::Dinner);
    assert_eq!(updated.notes.as_deref(), Some("rushed"));
    assert_eq!(updated.created_at, meal.created_at);

    let clear: UpdateMealRequest = serde_json::from_value(serde_json::json!({
        "notes": null
    }))?;
    let cleared = meals
        .update(meal.id, test_user_id(), &clear)
        .await?
        .unwrap();
    assert!(cleared.notes.is_none());
    Ok(())
}

#[tokio::test]
async fn test_update_cannot_drop_both_sources() -> Result<()> {
    let database = create_test_database().await?;
    let meals = database.meals();
    let meal = meals
        .create(test_user_id(), &custom_meal("2026-03-01", MealType::Lunch))
        .await?;

    let patch: UpdateMealRequest = serde_json::from_value(serde_json::json!({
        "customFoodName": null
    }))?;
    let err = meals
        .update(meal.id, test_user_id(), &patch)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
    Ok(())
}

#[tokio::test]
async fn test_delete_is_owner_scoped() -> Result<()> {
    let database = create_test_database().await?;
    let meals = database.meals();
    let meal = meals
        .create(test_user_id(), &custom_meal("2026-03-01", MealType::Lunch))
        .await?;

    assert!(!meals.delete(meal.id, other_user_id()).await?);
    assert!(meals.delete(meal.id, test_user_id()).await?);
    assert!(meals.get(meal.id, test_user_id()).await?.is_none());
    Ok(())
}
