//! Settings service
//!
//! Manages user preferences. Each preference is its own entry in the
//! key-value store; missing or unreadable entries fall back to defaults.

use crate::config::{
    DEFAULT_DIET, DEFAULT_MAX_CALORIES, HEALTH_CONSTRAINTS_KEY, MAX_CALORIES_KEY,
    MAX_MAX_CALORIES, MIN_MAX_CALORIES, ONBOARDING_COMPLETE_KEY, SELECTED_DIET_KEY,
};
use crate::error::{AppError, Result};
use crate::models::{MealConstraints, MealType};
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// User preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default = "default_diet")]
    pub selected_diet: String,
    #[serde(default = "default_max_calories")]
    pub max_calories: u32,
    /// Comma-separated health constraint tokens
    #[serde(default, rename = "activeHealthConstraints")]
    pub active_health_constraints_string: String,
    #[serde(default)]
    pub has_completed_onboarding: bool,
}

fn default_diet() -> String {
    DEFAULT_DIET.to_string()
}

fn default_max_calories() -> u32 {
    DEFAULT_MAX_CALORIES
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_diet: default_diet(),
            max_calories: default_max_calories(),
            active_health_constraints_string: String::new(),
            has_completed_onboarding: false,
        }
    }
}

impl UserSettings {
    /// The stored constraint string split into tokens
    pub fn active_health_constraints(&self) -> Vec<String> {
        self.active_health_constraints_string
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Search constraints for one meal slot
    pub fn meal_constraints(&self, meal_type: MealType) -> MealConstraints {
        MealConstraints {
            meal_type,
            max_calories: self.max_calories,
            health_constraints: self.active_health_constraints(),
        }
    }
}

/// Service for reading and updating user preferences
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load all preferences
    pub async fn load(&self) -> Result<UserSettings> {
        let defaults = UserSettings::default();

        Ok(UserSettings {
            selected_diet: self
                .read(SELECTED_DIET_KEY)
                .await?
                .unwrap_or(defaults.selected_diet),
            max_calories: self
                .read(MAX_CALORIES_KEY)
                .await?
                .unwrap_or(defaults.max_calories),
            active_health_constraints_string: self
                .read(HEALTH_CONSTRAINTS_KEY)
                .await?
                .unwrap_or(defaults.active_health_constraints_string),
            has_completed_onboarding: self
                .read(ONBOARDING_COMPLETE_KEY)
                .await?
                .unwrap_or(defaults.has_completed_onboarding),
        })
    }

    /// Save all preferences
    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        self.write(SELECTED_DIET_KEY, &settings.selected_diet).await?;
        self.write(MAX_CALORIES_KEY, settings.max_calories).await?;
        self.write(
            HEALTH_CONSTRAINTS_KEY,
            &settings.active_health_constraints_string,
        )
        .await?;
        self.write(ONBOARDING_COMPLETE_KEY, settings.has_completed_onboarding)
            .await?;

        tracing::info!("Settings saved");
        Ok(())
    }

    pub async fn set_selected_diet(&self, diet: &str) -> Result<()> {
        let diet = diet.trim().to_lowercase();
        if diet.is_empty() {
            return Err(AppError::InvalidSetting("diet cannot be empty".to_string()));
        }

        self.write(SELECTED_DIET_KEY, &diet).await
    }

    pub async fn set_max_calories(&self, max_calories: u32) -> Result<()> {
        if !(MIN_MAX_CALORIES..=MAX_MAX_CALORIES).contains(&max_calories) {
            return Err(AppError::InvalidSetting(format!(
                "max calories must be between {} and {}",
                MIN_MAX_CALORIES, MAX_MAX_CALORIES
            )));
        }

        self.write(MAX_CALORIES_KEY, max_calories).await
    }

    pub async fn set_health_constraints(&self, constraints: &[String]) -> Result<()> {
        let joined = constraints
            .iter()
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        self.write(HEALTH_CONSTRAINTS_KEY, &joined).await
    }

    pub async fn reset_health_constraints(&self) -> Result<()> {
        self.write(HEALTH_CONSTRAINTS_KEY, "").await
    }

    pub async fn complete_onboarding(&self) -> Result<()> {
        self.write(ONBOARDING_COMPLETE_KEY, true).await
    }

    /// Reset every preference to its default and mark onboarding done
    pub async fn apply_default_preferences(&self) -> Result<UserSettings> {
        let settings = UserSettings {
            has_completed_onboarding: true,
            ..UserSettings::default()
        };
        self.save(&settings).await?;
        Ok(settings)
    }

    async fn read<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };

        let parsed = std::str::from_utf8(&bytes)
            .ok()
            .and_then(|text| text.parse::<T>().ok());

        if parsed.is_none() {
            tracing::warn!("Ignoring unreadable value for setting {}", key);
        }
        Ok(parsed)
    }

    async fn write(&self, key: &str, value: impl ToString) -> Result<()> {
        self.store.set(key, value.to_string().as_bytes()).await?;
        tracing::debug!("Setting {} updated", key);
        Ok(())
    }
}
