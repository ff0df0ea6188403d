//! Inventory service
//!
//! Owns the list of ingredients the user has at home. Every change is
//! published to subscribers and scheduled for persistence.
//! Lookups that miss and duplicate transfers are logged, not returned as errors.

use crate::config::{INVENTORY_KEY, PERSIST_DEBOUNCE, PURCHASED_ITEM_QUANTITY, PURCHASED_ITEM_UNIT};
use crate::error::{AppError, Result};
use crate::models::{normalize_name, GroceryListItem, Ingredient};
use crate::storage::{KeyValueStore, PersistedCollection};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Manager for the ingredient inventory
pub struct InventoryManager {
    inventory: Vec<Ingredient>,
    changes: watch::Sender<Vec<Ingredient>>,
    persisted: PersistedCollection<Ingredient>,
}

impl InventoryManager {
    /// Load the stored inventory
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let persisted = PersistedCollection::new(store, INVENTORY_KEY, PERSIST_DEBOUNCE);
        let inventory = persisted.load().await;

        tracing::info!("Inventory loaded with {} ingredients", inventory.len());

        let (changes, _) = watch::channel(inventory.clone());
        Self {
            inventory,
            changes,
            persisted,
        }
    }

    pub fn inventory(&self) -> &[Ingredient] {
        &self.inventory
    }

    /// Receive a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Ingredient>> {
        self.changes.subscribe()
    }

    /// Lowercased ingredient names, in inventory order
    pub fn ingredient_names(&self) -> Vec<String> {
        self.inventory
            .iter()
            .map(|ingredient| ingredient.name.to_lowercase())
            .collect()
    }

    /// Add a new ingredient. Returns its id, or `None` for a blank name.
    pub fn add_ingredient(&mut self, name: &str, quantity: f64, unit: &str) -> Option<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("Ignoring ingredient with an empty name");
            return None;
        }

        let ingredient = Ingredient::new(name, quantity, unit.trim());
        let id = ingredient.id;
        self.inventory.push(ingredient);
        self.commit();

        tracing::debug!("Added ingredient {}: {}", id, name);
        Some(id)
    }

    /// Replace an ingredient's fields. Returns false if no ingredient has `id`
    /// or the new name is blank.
    pub fn update_ingredient(
        &mut self,
        id: Uuid,
        new_name: &str,
        new_quantity: f64,
        new_unit: &str,
    ) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            tracing::warn!("Ignoring update of {} to an empty name", id);
            return false;
        }

        let index = match self.index_of(id) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!("Cannot update: {}", e);
                return false;
            }
        };

        let ingredient = &mut self.inventory[index];
        ingredient.name = new_name.to_string();
        ingredient.quantity = new_quantity;
        ingredient.unit = new_unit.trim().to_string();
        self.commit();

        tracing::debug!("Updated ingredient {}", id);
        true
    }

    /// Remove every ingredient whose id is in `ids`. Returns how many were removed.
    pub fn remove_ingredients(&mut self, ids: &HashSet<Uuid>) -> usize {
        let before = self.inventory.len();
        self.inventory.retain(|ingredient| !ids.contains(&ingredient.id));
        let removed = before - self.inventory.len();

        self.commit();

        tracing::debug!("Removed {} ingredients", removed);
        removed
    }

    /// Move a purchased grocery item into the inventory.
    ///
    /// Skips items whose normalized name is already present, so repeated
    /// transfers of the same item leave one entry. Returns whether an
    /// ingredient was added.
    pub fn receive_purchased_item(&mut self, item: &GroceryListItem) -> bool {
        let normalized = normalize_name(&item.name);

        if self
            .inventory
            .iter()
            .any(|ingredient| ingredient.normalized_name() == normalized)
        {
            tracing::info!("Item {} already in inventory. Skipping addition.", item.name);
            return false;
        }

        self.inventory.push(Ingredient::new(
            item.name.trim(),
            PURCHASED_ITEM_QUANTITY,
            PURCHASED_ITEM_UNIT,
        ));
        self.commit();

        tracing::info!("Purchased item {} moved to inventory", item.name);
        true
    }

    /// Write any pending changes to the store
    pub fn flush(&self) -> impl Future<Output = ()> + Send + 'static {
        self.persisted.flush()
    }

    fn index_of(&self, id: Uuid) -> Result<usize> {
        self.inventory
            .iter()
            .position(|ingredient| ingredient.id == id)
            .ok_or_else(|| AppError::NotFound {
                entity: "Ingredient",
                id: id.to_string(),
            })
    }

    fn commit(&mut self) {
        self.changes.send_replace(self.inventory.clone());
        self.persisted.save(&self.inventory);
    }
}
