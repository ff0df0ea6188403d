//! Saved recipes service
//!
//! Recipes are immutable once saved; the only operations are add and delete.

use crate::config::{PERSIST_DEBOUNCE, SAVED_RECIPES_KEY};
use crate::models::MealModel;
use crate::storage::{KeyValueStore, PersistedCollection};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Manager for the user's saved recipes
pub struct RecipeManager {
    saved_recipes: Vec<MealModel>,
    changes: watch::Sender<Vec<MealModel>>,
    persisted: PersistedCollection<MealModel>,
}

impl RecipeManager {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let persisted = PersistedCollection::new(store, SAVED_RECIPES_KEY, PERSIST_DEBOUNCE);
        let saved_recipes = persisted.load().await;

        tracing::info!("Loaded {} saved recipes", saved_recipes.len());

        let (changes, _) = watch::channel(saved_recipes.clone());
        Self {
            saved_recipes,
            changes,
            persisted,
        }
    }

    pub fn saved_recipes(&self) -> &[MealModel] {
        &self.saved_recipes
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<MealModel>> {
        self.changes.subscribe()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.saved_recipes.iter().any(|meal| meal.id == id)
    }

    /// Save a meal. Returns false if a meal with the same id is already saved.
    pub fn add_recipe(&mut self, meal: MealModel) -> bool {
        if self.contains(&meal.id) {
            tracing::debug!("Recipe {} already saved", meal.id);
            return false;
        }

        tracing::info!("Saving recipe {}: {}", meal.id, meal.label);
        self.saved_recipes.push(meal);
        self.commit();
        true
    }

    /// Delete the recipes at `indices`; indices past the end are ignored
    pub fn delete_recipes(&mut self, indices: &BTreeSet<usize>) -> usize {
        let before = self.saved_recipes.len();
        let mut index = 0;
        self.saved_recipes.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        let removed = before - self.saved_recipes.len();

        self.commit();

        tracing::info!(
            "Deleted {} recipe(s). New count: {}",
            removed,
            self.saved_recipes.len()
        );
        removed
    }

    pub fn flush(&self) -> impl Future<Output = ()> + Send + 'static {
        self.persisted.flush()
    }

    fn commit(&mut self) {
        self.changes.send_replace(self.saved_recipes.clone());
        self.persisted.save(&self.saved_recipes);
    }
}
