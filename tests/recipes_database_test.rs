// ABOUTME: Integration tests for recipe persistence operations
// ABOUTME: Covers owner scoping, partial updates, public catalog, and import
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

mod common;

use anyhow::Result;
use common::{create_test_database, other_user_id, test_user_id};
use mealtrack::database::recipes::{
    CreateRecipeRequest, Difficulty, IngredientInput, NutritionInfo, UpdateRecipeRequest,
};
use mealtrack::errors::ErrorCode;

fn pancakes_request() -> CreateRecipeRequest {
    CreateRecipeRequest {
        name: "Pancakes".to_owned(),
        description: Some("Weekend breakfast".to_owned()),
        difficulty: Some(Difficulty::Easy),
        servings: Some(4),
        instructions: vec!["Mix".to_owned(), "Fry".to_owned()],
        ingredients: vec![
            IngredientInput {
                name: "flour".to_owned(),
                amount: 200.0,
                unit: "g".to_owned(),
            },
            IngredientInput {
                name: "milk".to_owned(),
                amount: 300.0,
                unit: "ml".to_owned(),
            },
        ],
        nutrition: Some(NutritionInfo {
            calories: Some(350.0),
            protein: Some(9.0),
            ..NutritionInfo::default()
        }),
        ..CreateRecipeRequest::default()
    }
}

#[tokio::test]
async fn test_create_returns_stored_record() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();

    let recipe = recipes.create(test_user_id(), &pancakes_request()).await?;
    assert_eq!(recipe.name, "Pancakes");
    assert_eq!(recipe.user_id, test_user_id());
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredients[0].name, "flour");
    assert_eq!(recipe.instructions, vec!["Mix", "Fry"]);
    assert!(!recipe.is_public);
    assert_eq!(recipe.created_at, recipe.updated_at);
    Ok(())
}

#[tokio::test]
async fn test_list_is_owner_scoped_and_newest_first() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();

    let first = recipes.create(test_user_id(), &pancakes_request()).await?;
    let mut second_request = pancakes_request();
    second_request.name = "Omelette".to_owned();
    let second = recipes.create(test_user_id(), &second_request).await?;
    recipes.create(other_user_id(), &pancakes_request()).await?;

    let listed = recipes.list(test_user_id()).await?;
    assert_eq!(listed.len(), 2);
    // newest first; equal timestamps fall back to insertion order either way
    let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
    for window in listed.windows(2) {
        assert!(window[0].created_at >= window[1].created_at);
    }
    Ok(())
}

#[tokio::test]
async fn test_get_refuses_foreign_rows() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();

    let recipe = recipes.create(test_user_id(), &pancakes_request()).await?;
    assert!(recipes.get(recipe.id, test_user_id()).await?.is_some());
    assert!(recipes.get(recipe.id, other_user_id()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_update_merges_and_clears() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();
    let recipe = recipes.create(test_user_id(), &pancakes_request()).await?;

    // absent description keeps it; explicit null clears it
    let keep: UpdateRecipeRequest = serde_json::from_value(serde_json::json!({
        "name": "Thick Pancakes"
    }))?;
    let updated = recipes
        .update(recipe.id, test_user_id(), &keep)
        .await?
        .unwrap();
    assert_eq!(updated.name, "Thick Pancakes");
    assert_eq!(updated.description.as_deref(), Some("Weekend breakfast"));

    let clear: UpdateRecipeRequest = serde_json::from_value(serde_json::json!({
        "description": null
    }))?;
    let cleared = recipes
        .update(recipe.id, test_user_id(), &clear)
        .await?
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.name, "Thick Pancakes");
    assert!(cleared.updated_at >= recipe.updated_at);
    Ok(())
}

#[tokio::test]
async fn test_update_replaces_ingredients_wholesale() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();
    let recipe = recipes.create(test_user_id(), &pancakes_request()).await?;

    let request: UpdateRecipeRequest = serde_json::from_value(serde_json::json!({
        "ingredients": [{"name": "oats", "amount": 100.0, "unit": "g"}]
    }))?;
    let updated = recipes
        .update(recipe.id, test_user_id(), &request)
        .await?
        .unwrap();
    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].name, "oats");
    Ok(())
}

#[tokio::test]
async fn test_update_rejects_invalid_merged_state() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();
    let recipe = recipes.create(test_user_id(), &pancakes_request()).await?;

    let request: UpdateRecipeRequest = serde_json::from_value(serde_json::json!({
        "name": ""
    }))?;
    let err = recipes
        .update(recipe.id, test_user_id(), &request)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
    Ok(())
}

#[tokio::test]
async fn test_delete_removes_row() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();
    let recipe = recipes.create(test_user_id(), &pancakes_request()).await?;

    assert!(recipes.delete(recipe.id, test_user_id()).await?);
    assert!(recipes.get(recipe.id, test_user_id()).await?.is_none());
    // second delete finds nothing
    assert!(!recipes.delete(recipe.id, test_user_id()).await?);
    Ok(())
}

#[tokio::test]
async fn test_public_catalog_only_shows_published() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();

    let mut public_request = pancakes_request();
    public_request.is_public = true;
    let public = recipes.create(test_user_id(), &public_request).await?;
    let private = recipes.create(test_user_id(), &pancakes_request()).await?;

    let catalog = recipes.list_public().await?;
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].id, public.id);

    assert!(recipes.get_public(public.id).await?.is_some());
    assert!(recipes.get_public(private.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_import_copies_surface_fields_only() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();

    let mut public_request = pancakes_request();
    public_request.is_public = true;
    public_request.image_url = Some("/api/images/abc.png".to_owned());
    let public = recipes.create(other_user_id(), &public_request).await?;

    let imported = recipes
        .import_public(public.id, test_user_id())
        .await?
        .unwrap();
    assert_ne!(imported.id, public.id);
    assert_eq!(imported.user_id, test_user_id());
    assert_eq!(imported.name, public.name);
    assert_eq!(imported.description, public.description);
    assert_eq!(imported.image_url, public.image_url);
    // the copy is private and carries none of the structured detail
    assert!(!imported.is_public);
    assert!(imported.ingredients.is_empty());
    assert!(imported.instructions.is_empty());
    assert!(imported.nutrition.is_none());
    Ok(())
}

#[tokio::test]
async fn test_import_refuses_private_recipes() -> Result<()> {
    let database = create_test_database().await?;
    let recipes = database.recipes();

    let private = recipes.create(other_user_id(), &pancakes_request()).await?;
    assert!(recipes
        .import_public(private.id, test_user_id())
        .await?
        .is_none());
    Ok(())
}
