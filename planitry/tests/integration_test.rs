//! Integration tests for Planitry
//!
//! These tests verify end-to-end functionality including:
//! - Collections persisting in the SQLite store across restarts
//! - Grocery purchases flowing into the inventory
//! - Settings driving recipe searches

use planitry::config::{RecipeApiConfig, GROCERY_LIST_KEY, INVENTORY_KEY};
use planitry::database::{create_pool, Repository};
use planitry::models::{MealModel, MealType};
use planitry::services::{InventoryManager, SettingsService};
use planitry::storage::KeyValueStore;
use planitry::AppState;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test database with schema
async fn create_test_db() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let pool = create_pool(&db_path).await.unwrap();
    let repo = Repository::new(pool);

    (repo, temp_dir)
}

fn offline_config() -> RecipeApiConfig {
    RecipeApiConfig::new("id", "key").with_base_url("http://127.0.0.1:9/api/recipes/v2")
}

fn sample_meal() -> MealModel {
    MealModel {
        id: "stirfry".to_string(),
        label: "Veggie Stir Fry".to_string(),
        image_url: String::new(),
        url: "https://example.com/stirfry".to_string(),
        source: "Test Kitchen".to_string(),
        servings: 2.0,
        calories: 700.0,
        total_time: 20.0,
        meal_type: vec!["lunch/dinner".to_string()],
        diet_labels: Vec::new(),
        health_labels: vec!["Vegan".to_string()],
        ingredients: vec!["1 head broccoli".to_string(), "2 tbsp soy sauce".to_string()],
        ingredient_names: vec!["broccoli".to_string(), "soy sauce".to_string()],
    }
}

#[tokio::test]
async fn test_inventory_round_trip_through_sqlite() {
    let (repo, _temp) = create_test_db().await;
    let store: Arc<dyn KeyValueStore> = Arc::new(repo.clone());

    let mut inventory = InventoryManager::load(Arc::clone(&store)).await;
    let flour = inventory.add_ingredient("Flour", 500.0, "g").unwrap();
    inventory.add_ingredient("Sugar", 1.0, "kg").unwrap();
    inventory.remove_ingredients(&HashSet::from([flour]));
    inventory.flush().await;

    assert_eq!(repo.list_keys().await.unwrap(), vec![INVENTORY_KEY.to_string()]);

    let reloaded = InventoryManager::load(store).await;
    assert_eq!(reloaded.inventory(), inventory.inventory());
    assert_eq!(reloaded.ingredient_names(), vec!["sugar"]);
}

#[tokio::test]
async fn test_corrupt_collection_is_discarded() {
    let (repo, _temp) = create_test_db().await;
    repo.set(INVENTORY_KEY, b"{not json").await.unwrap();

    let inventory = InventoryManager::load(Arc::new(repo.clone())).await;

    assert!(inventory.inventory().is_empty());
    assert_eq!(repo.get(INVENTORY_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        let state = AppState::setup(temp_dir.path(), offline_config()).await.unwrap();

        let id = state.grocery_list.lock().unwrap().add_item("Tofu").unwrap();
        state.grocery_list.lock().unwrap().add_item("Rice").unwrap();
        state.grocery_list.lock().unwrap().toggle_item_checked(id);

        assert!(state.save_meal(sample_meal()).unwrap());
        assert!(!state.save_meal(sample_meal()).unwrap());

        state.settings.set_selected_diet("vegan").await.unwrap();
        state.flush().await.unwrap();
    }

    let state = AppState::setup(temp_dir.path(), offline_config()).await.unwrap();

    let inventory = state.inventory.lock().unwrap().ingredient_names();
    assert_eq!(inventory, vec!["tofu"]);

    {
        let grocery_list = state.grocery_list.lock().unwrap();
        let names: Vec<_> = grocery_list.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Tofu", "Rice"]);
        assert!(grocery_list.items()[0].is_checked);
    }

    assert_eq!(state.recipes.lock().unwrap().saved_recipes(), &[sample_meal()]);
    assert_eq!(state.settings.load().await.unwrap().selected_diet, "vegan");

    let keys = state.repository.list_keys().await.unwrap();
    assert!(keys.contains(&GROCERY_LIST_KEY.to_string()));
}

#[tokio::test]
async fn test_repeated_purchases_leave_one_inventory_entry() {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::setup(temp_dir.path(), offline_config()).await.unwrap();

    let id = state.grocery_list.lock().unwrap().add_item("Milk").unwrap();
    for _ in 0..3 {
        state.grocery_list.lock().unwrap().toggle_item_checked(id);
    }

    let inventory = state.inventory.lock().unwrap();
    assert_eq!(inventory.inventory().len(), 1);
    assert_eq!(inventory.inventory()[0].quantity, 1.0);
    assert_eq!(inventory.inventory()[0].unit, "unit");
}

#[tokio::test]
async fn test_meal_ingredients_go_to_grocery_list() {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::setup(temp_dir.path(), offline_config()).await.unwrap();
    state.grocery_list.lock().unwrap().add_item("Broccoli").unwrap();

    let added = state.add_meal_to_grocery_list(&sample_meal()).unwrap();

    assert_eq!(added, 1);
    assert_eq!(state.grocery_list.lock().unwrap().items().len(), 2);
}

#[tokio::test]
async fn test_generate_meal_uses_stored_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/recipes/v2"))
        .and(query_param("mealType", "breakfast"))
        .and(query_param("calories", "0-1200"))
        .and(query_param("health", "vegan"))
        .and(query_param("health", "tree-nut-free"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": [{ "recipe": { "uri": "http://www.edamam.com/ontologies/edamam.owl#recipe_oats" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/recipes/v2/oats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recipe": {
                "uri": "http://www.edamam.com/ontologies/edamam.owl#recipe_oats",
                "label": "Overnight Oats",
                "yield": 1.0,
                "calories": 350.0,
                "ingredientLines": ["1 cup oats"]
            }
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = RecipeApiConfig::new("id", "key")
        .with_base_url(format!("{}/api/recipes/v2", server.uri()));
    let state = AppState::setup(temp_dir.path(), config).await.unwrap();

    let settings = SettingsService::new(Arc::new(state.repository.clone()));
    settings.set_selected_diet("vegan").await.unwrap();
    settings.set_max_calories(600).await.unwrap();
    settings
        .set_health_constraints(&["tree nut free".to_string()])
        .await
        .unwrap();

    let meal = state.generate_meal(MealType::Breakfast).await.unwrap();

    assert_eq!(meal.id, "oats");
    assert_eq!(meal.label, "Overnight Oats");
    assert_eq!(meal.ingredient_names, vec!["1 cup oats"]);
}
