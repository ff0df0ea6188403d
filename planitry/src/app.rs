//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::{RecipeApiConfig, DATABASE_FILE_NAME, WEEKLY_PLAN_SIZE};
use crate::database::{create_pool, Repository};
use crate::error::{AppError, Result};
use crate::models::{GroceryListItem, MealModel, MealType};
use crate::services::{
    GroceryListManager, InventoryManager, RecipeManager, RecipeSearchClient, SettingsService,
    TransferHandler,
};
use crate::storage::KeyValueStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG`. Calling this more than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planitry=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Central application state holding all services
pub struct AppState {
    pub data_dir: PathBuf,
    pub repository: Repository,
    pub settings: SettingsService,
    pub inventory: Arc<Mutex<InventoryManager>>,
    pub grocery_list: Arc<Mutex<GroceryListManager>>,
    pub recipes: Arc<Mutex<RecipeManager>>,
    pub recipe_search: RecipeSearchClient,
}

impl AppState {
    /// Open the database under `data_dir`, load every collection and build
    /// the search client.
    pub async fn setup(data_dir: impl AsRef<Path>, api_config: RecipeApiConfig) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", data_dir);

        std::fs::create_dir_all(&data_dir)?;

        let pool = create_pool(&data_dir.join(DATABASE_FILE_NAME)).await?;
        let repository = Repository::new(pool);
        let store: Arc<dyn KeyValueStore> = Arc::new(repository.clone());

        let inventory = Arc::new(Mutex::new(InventoryManager::load(Arc::clone(&store)).await));

        let sink = Arc::clone(&inventory);
        let on_purchased: TransferHandler = Box::new(move |item: &GroceryListItem| {
            match sink.lock() {
                Ok(mut inventory) => {
                    inventory.receive_purchased_item(item);
                }
                Err(_) => tracing::error!("Inventory unavailable; {} not transferred", item.name),
            }
        });

        let grocery_list = Arc::new(Mutex::new(
            GroceryListManager::load(Arc::clone(&store), on_purchased).await,
        ));
        let recipes = Arc::new(Mutex::new(RecipeManager::load(Arc::clone(&store)).await));

        let state = Self {
            data_dir,
            repository,
            settings: SettingsService::new(store),
            inventory,
            grocery_list,
            recipes,
            recipe_search: RecipeSearchClient::new(api_config)?,
        };

        tracing::info!("Application initialized successfully");
        Ok(state)
    }

    /// Fetch one meal using the stored preferences
    pub async fn generate_meal(&self, meal_type: MealType) -> Result<MealModel> {
        let settings = self.settings.load().await?;
        let constraints = settings.meal_constraints(meal_type);

        let meal = self
            .recipe_search
            .fetch_meal(&constraints, &settings.selected_diet)
            .await?;
        Ok(meal)
    }

    /// Fetch a week of meals using the stored preferences
    pub async fn plan_week(&self, meal_type: MealType) -> Result<Vec<MealModel>> {
        let settings = self.settings.load().await?;
        let constraints = settings.meal_constraints(meal_type);

        let meals = self
            .recipe_search
            .fetch_meals(&constraints, &settings.selected_diet, WEEKLY_PLAN_SIZE)
            .await?;
        Ok(meals)
    }

    /// Find the recipe that best uses what is in the inventory
    pub async fn find_recipe_from_inventory(&self) -> Result<MealModel> {
        let names = lock(&self.inventory)?.ingredient_names();

        let meal = self
            .recipe_search
            .fetch_recipe_by_ingredients(&names)
            .await?;
        Ok(meal)
    }

    /// Save a meal to the recipe book. Returns false if it was already saved.
    pub fn save_meal(&self, meal: MealModel) -> Result<bool> {
        Ok(lock(&self.recipes)?.add_recipe(meal))
    }

    /// Put a meal's ingredients on the grocery list
    pub fn add_meal_to_grocery_list(&self, meal: &MealModel) -> Result<usize> {
        Ok(lock(&self.grocery_list)?.add_meal_ingredients(meal))
    }

    /// Write every pending collection change to the database
    pub async fn flush(&self) -> Result<()> {
        let inventory = lock(&self.inventory)?.flush();
        let grocery_list = lock(&self.grocery_list)?.flush();
        let recipes = lock(&self.recipes)?.flush();

        tokio::join!(inventory, grocery_list, recipes);
        tracing::debug!("All collections flushed");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::Generic("Application state lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = RecipeApiConfig::new("id", "key").with_base_url("http://127.0.0.1:9/v2");
        let state = AppState::setup(temp_dir.path().join("data"), config)
            .await
            .unwrap();
        (state, temp_dir)
    }

    #[tokio::test]
    async fn test_setup_creates_database() {
        let (state, _temp) = create_test_state().await;

        assert!(state.data_dir.join(DATABASE_FILE_NAME).exists());
        assert!(state.inventory.lock().unwrap().inventory().is_empty());
        assert!(!state.recipe_search.is_fetching());
    }

    #[tokio::test]
    async fn test_checking_grocery_item_stocks_inventory() {
        let (state, _temp) = create_test_state().await;

        let id = state.grocery_list.lock().unwrap().add_item("Olive Oil").unwrap();
        state.grocery_list.lock().unwrap().toggle_item_checked(id);

        let inventory = state.inventory.lock().unwrap();
        assert_eq!(inventory.inventory().len(), 1);
        assert_eq!(inventory.inventory()[0].name, "Olive Oil");
    }

    #[tokio::test]
    async fn test_find_recipe_with_empty_inventory_is_invalid_request() {
        let (state, _temp) = create_test_state().await;

        let err = state.find_recipe_from_inventory().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Network(crate::error::NetworkError::InvalidRequest(_))
        ));
    }
}
