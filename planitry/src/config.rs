//! Application configuration constants
//!
//! Central location for storage keys, persistence timing, validation
//! boundaries, and the recipe API connection settings.

use crate::error::{AppError, Result};
use std::time::Duration;

// ===== Storage Keys =====

/// Key of the inventory collection blob
pub const INVENTORY_KEY: &str = "myInventoryData";
/// Key of the grocery list collection blob
pub const GROCERY_LIST_KEY: &str = "groceryListData";
/// Key of the saved recipes collection blob
pub const SAVED_RECIPES_KEY: &str = "SavedRecipes";

/// Scalar settings keys
pub const SELECTED_DIET_KEY: &str = "selectedDiet";
pub const MAX_CALORIES_KEY: &str = "maxCalories";
pub const HEALTH_CONSTRAINTS_KEY: &str = "activeHealthConstraints";
pub const ONBOARDING_COMPLETE_KEY: &str = "hasCompletedOnboarding";

/// SQLite file name inside the app data directory
pub const DATABASE_FILE_NAME: &str = "planitry.db";

/// Connections in the application pool. Writers serialize on SQLite's lock,
/// so a few connections are enough for the per-collection writer tasks.
pub const DATABASE_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits on a locked database before failing
pub const DATABASE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ===== Persistence =====

/// Quiet period before a collection snapshot is written.
/// Rapid edits inside this window coalesce into one write.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

// ===== Inventory Transfer =====

/// Quantity given to an ingredient that arrives from the grocery list
pub const PURCHASED_ITEM_QUANTITY: f64 = 1.0;
/// Unit given to an ingredient that arrives from the grocery list
pub const PURCHASED_ITEM_UNIT: &str = "unit";

// ===== Preference Defaults and Limits =====

pub const DEFAULT_DIET: &str = "balanced";
pub const DEFAULT_MAX_CALORIES: u32 = 2000;

/// Lowest accepted daily calorie cap
pub const MIN_MAX_CALORIES: u32 = 500;
/// Highest accepted daily calorie cap
pub const MAX_MAX_CALORIES: u32 = 10_000;

/// Meals fetched for one planner week
pub const WEEKLY_PLAN_SIZE: usize = 7;

// ===== Recipe API =====

/// Edamam Recipe Search v2 endpoint
pub const DEFAULT_RECIPE_API_BASE_URL: &str = "https://api.edamam.com/api/recipes/v2";

/// Per-request timeout for recipe API calls
pub const RECIPE_API_TIMEOUT: Duration = Duration::from_secs(20);

pub const APP_ID_ENV: &str = "PLANITRY_EDAMAM_APP_ID";
pub const APP_KEY_ENV: &str = "PLANITRY_EDAMAM_APP_KEY";
pub const BASE_URL_ENV: &str = "PLANITRY_EDAMAM_BASE_URL";

/// Connection settings for the recipe search API
#[derive(Debug, Clone)]
pub struct RecipeApiConfig {
    pub base_url: String,
    pub app_id: String,
    pub app_key: String,
    pub timeout: Duration,
}

impl RecipeApiConfig {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_RECIPE_API_BASE_URL.to_string(),
            app_id: app_id.into(),
            app_key: app_key.into(),
            timeout: RECIPE_API_TIMEOUT,
        }
    }

    /// Point the client at a different endpoint (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read credentials from the environment
    pub fn from_env() -> Result<Self> {
        let app_id = read_env(APP_ID_ENV)?;
        let app_key = read_env(APP_KEY_ENV)?;

        let config = Self::new(app_id, app_key);
        Ok(match std::env::var(BASE_URL_ENV) {
            Ok(base_url) if !base_url.trim().is_empty() => config.with_base_url(base_url),
            _ => config,
        })
    }
}

fn read_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_endpoint() {
        let config = RecipeApiConfig::new("id", "key");
        assert_eq!(config.base_url, DEFAULT_RECIPE_API_BASE_URL);
        assert_eq!(config.timeout, RECIPE_API_TIMEOUT);

        let config = config.with_base_url("http://localhost:9000/v2");
        assert_eq!(config.base_url, "http://localhost:9000/v2");
    }

    #[test]
    fn test_read_env_rejects_missing_variable() {
        let err = read_env("PLANITRY_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
