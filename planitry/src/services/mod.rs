//! Services module
//!
//! Stateful managers for the local collections, the settings service and
//! the recipe search client.

pub mod edamam;
pub mod grocery_list;
pub mod inventory;
pub mod recipe_search;
pub mod recipes;
pub mod settings;

pub use grocery_list::{GroceryListManager, TransferHandler};
pub use inventory::InventoryManager;
pub use recipe_search::{FetchStatus, RecipeSearchClient};
pub use recipes::RecipeManager;
pub use settings::{SettingsService, UserSettings};
