//! Grocery list service
//!
//! Manages the shopping list. Checking an item off hands it to the transfer
//! handler supplied at construction, which the app wires to the inventory.

use crate::config::{GROCERY_LIST_KEY, PERSIST_DEBOUNCE};
use crate::models::{normalize_name, GroceryListItem, MealModel};
use crate::storage::{KeyValueStore, PersistedCollection};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Called with an item when it goes from unchecked to checked
pub type TransferHandler = Box<dyn Fn(&GroceryListItem) + Send + Sync>;

/// Manager for the grocery list
pub struct GroceryListManager {
    items: Vec<GroceryListItem>,
    changes: watch::Sender<Vec<GroceryListItem>>,
    persisted: PersistedCollection<GroceryListItem>,
    on_purchased: TransferHandler,
}

impl GroceryListManager {
    /// Load the stored list
    pub async fn load(store: Arc<dyn KeyValueStore>, on_purchased: TransferHandler) -> Self {
        let persisted = PersistedCollection::new(store, GROCERY_LIST_KEY, PERSIST_DEBOUNCE);
        let items = persisted.load().await;

        tracing::info!("Grocery list loaded with {} items", items.len());

        let (changes, _) = watch::channel(items.clone());
        Self {
            items,
            changes,
            persisted,
            on_purchased,
        }
    }

    pub fn items(&self) -> &[GroceryListItem] {
        &self.items
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<GroceryListItem>> {
        self.changes.subscribe()
    }

    /// Items still to buy
    pub fn remaining(&self) -> Vec<&GroceryListItem> {
        self.items.iter().filter(|item| !item.is_checked).collect()
    }

    /// Items already bought
    pub fn checked(&self) -> Vec<&GroceryListItem> {
        self.items.iter().filter(|item| item.is_checked).collect()
    }

    /// Add an item unless one with the same normalized name is already listed
    pub fn add_item(&mut self, name: &str) -> Option<Uuid> {
        let id = self.push_unique(name)?;
        self.commit();
        Some(id)
    }

    /// Add every ingredient of a meal. Returns how many new items were listed.
    pub fn add_meal_ingredients(&mut self, meal: &MealModel) -> usize {
        let names = if meal.ingredient_names.is_empty() {
            &meal.ingredients
        } else {
            &meal.ingredient_names
        };

        let added = names
            .iter()
            .filter(|name| self.push_unique(name).is_some())
            .count();

        if added > 0 {
            self.commit();
        }

        tracing::info!("Added {} ingredients from {} to grocery list", added, meal.label);
        added
    }

    /// Flip an item's checked flag and return the new state.
    ///
    /// Checking an item passes it to the transfer handler; unchecking never
    /// takes it back out of the inventory.
    pub fn toggle_item_checked(&mut self, id: Uuid) -> Option<bool> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            tracing::warn!("Grocery item {} not found for toggle", id);
            return None;
        };

        item.is_checked = !item.is_checked;
        let is_checked = item.is_checked;
        if is_checked {
            (self.on_purchased)(&*item);
        }

        self.commit();
        Some(is_checked)
    }

    pub fn remove_item(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);

        if self.items.len() == before {
            tracing::warn!("Grocery item {} not found for removal", id);
            return false;
        }

        self.commit();
        true
    }

    pub fn clear_list(&mut self) {
        self.items.clear();
        self.commit();
        tracing::info!("Grocery list cleared");
    }

    /// Wait until the latest snapshot is stored
    pub fn flush(&self) -> impl Future<Output = ()> + Send + 'static {
        self.persisted.flush()
    }

    fn push_unique(&mut self, name: &str) -> Option<Uuid> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            tracing::warn!("Ignoring grocery item with an empty name");
            return None;
        }

        if self
            .items
            .iter()
            .any(|item| item.normalized_name() == normalized)
        {
            tracing::debug!("{} already in grocery list", name.trim());
            return None;
        }

        let item = GroceryListItem::new(name.trim());
        let id = item.id;
        self.items.push(item);

        tracing::debug!("Added to grocery list: {}", name.trim());
        Some(id)
    }

    fn commit(&mut self) {
        self.changes.send_replace(self.items.clone());
        self.persisted.save(&self.items);
    }
}
