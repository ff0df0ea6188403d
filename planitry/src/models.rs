//! Domain models
//!
//! Rust structs for the persisted entities and the per-search value objects.
//! All persisted models use serde with camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowercased, whitespace-trimmed form of an item name used for duplicate checks
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// An ingredient the user has at home
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub date_added: DateTime<Utc>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            quantity,
            unit: unit.into(),
            date_added: Utc::now(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// A single entry on the grocery list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryListItem {
    pub id: Uuid,
    pub name: String,
    pub is_checked: bool,
    pub date_added: DateTime<Utc>,
}

impl GroceryListItem {
    /// New items always start unchecked
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_checked: false,
            date_added: Utc::now(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// A recipe returned by the search API, or saved by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealModel {
    pub id: String,
    pub label: String,
    pub image_url: String,
    pub url: String,
    /// Publisher name, e.g. "Food Network"
    pub source: String,
    /// Number of servings
    #[serde(rename = "yield")]
    pub servings: f64,
    /// Calories for the whole recipe
    pub calories: f64,
    /// Minutes
    pub total_time: f64,
    #[serde(default)]
    pub meal_type: Vec<String>,
    #[serde(default)]
    pub diet_labels: Vec<String>,
    #[serde(default)]
    pub health_labels: Vec<String>,
    /// Raw ingredient description lines
    pub ingredients: Vec<String>,
    /// Clean names, index-aligned with `ingredients` when fully populated
    #[serde(default)]
    pub ingredient_names: Vec<String>,
}

impl MealModel {
    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    pub fn calories_per_serving(&self) -> i64 {
        if self.servings > 0.0 {
            (self.calories / self.servings).round() as i64
        } else {
            self.calories.round() as i64
        }
    }

    pub fn total_time_minutes(&self) -> i64 {
        self.total_time as i64
    }

    /// Up to two display tags, preferring health labels over diet labels
    pub fn tags(&self) -> Vec<String> {
        let labels = if !self.health_labels.is_empty() {
            &self.health_labels
        } else {
            &self.diet_labels
        };

        labels
            .iter()
            .take(2)
            .map(|label| capitalize_words(label))
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Meal slots the planner can search for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub fn api_value(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }
}

/// User-selectable health restrictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthConstraint {
    GlutenFree,
    PeanutFree,
    DairyFree,
    SugarFree,
    TreeNutFree,
    AlcoholFree,
}

impl HealthConstraint {
    pub const ALL: [HealthConstraint; 6] = [
        HealthConstraint::GlutenFree,
        HealthConstraint::PeanutFree,
        HealthConstraint::DairyFree,
        HealthConstraint::SugarFree,
        HealthConstraint::TreeNutFree,
        HealthConstraint::AlcoholFree,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            HealthConstraint::GlutenFree => "Gluten Free",
            HealthConstraint::PeanutFree => "Peanut Free",
            HealthConstraint::DairyFree => "Dairy Free",
            HealthConstraint::SugarFree => "Sugar Free",
            HealthConstraint::TreeNutFree => "Tree Nut Free",
            HealthConstraint::AlcoholFree => "Alcohol Free",
        }
    }

    pub fn api_value(self) -> &'static str {
        match self {
            HealthConstraint::GlutenFree => "gluten-free",
            HealthConstraint::PeanutFree => "peanut-free",
            HealthConstraint::DairyFree => "dairy-free",
            // Edamam has no sugar-free label
            HealthConstraint::SugarFree => "sugar-conscious",
            HealthConstraint::TreeNutFree => "tree-nut-free",
            HealthConstraint::AlcoholFree => "alcohol-free",
        }
    }

    /// Resolve a stored token or a display name, ignoring case and the
    /// space/hyphen difference between the two forms
    pub fn from_label(value: &str) -> Option<Self> {
        let token = hyphenate(value);
        Self::ALL.into_iter().find(|constraint| {
            token == constraint.api_value() || token == hyphenate(constraint.display_name())
        })
    }
}

/// Lowercased token with spaces replaced by hyphens
pub fn hyphenate(value: &str) -> String {
    normalize_name(value).replace(' ', "-")
}

/// Diet choices offered in preferences.
///
/// The first group maps to Edamam's `diet` parameter, the second to `health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietOption {
    Balanced,
    LowCarb,
    HighProtein,
    LowFat,
    LowSodium,
    HighFiber,
    Keto,
    Vegan,
    Vegetarian,
    GlutenFree,
    DairyFree,
}

/// Which query parameter a diet token is sent under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietParam {
    Diet,
    Health,
}

impl DietParam {
    pub fn name(self) -> &'static str {
        match self {
            DietParam::Diet => "diet",
            DietParam::Health => "health",
        }
    }
}

impl DietOption {
    pub const ALL: [DietOption; 11] = [
        DietOption::Balanced,
        DietOption::LowCarb,
        DietOption::HighProtein,
        DietOption::LowFat,
        DietOption::LowSodium,
        DietOption::HighFiber,
        DietOption::Keto,
        DietOption::Vegan,
        DietOption::Vegetarian,
        DietOption::GlutenFree,
        DietOption::DairyFree,
    ];

    /// Value stored in settings
    pub fn api_value(self) -> &'static str {
        match self {
            DietOption::Balanced => "balanced",
            DietOption::LowCarb => "low-carb",
            DietOption::HighProtein => "high-protein",
            DietOption::LowFat => "low-fat",
            DietOption::LowSodium => "low-sodium",
            DietOption::HighFiber => "high-fiber",
            DietOption::Keto => "keto",
            DietOption::Vegan => "vegan",
            DietOption::Vegetarian => "vegetarian",
            DietOption::GlutenFree => "gluten-free",
            DietOption::DairyFree => "dairy-free",
        }
    }

    pub fn from_api_value(value: &str) -> Option<Self> {
        let value = normalize_name(value);
        Self::ALL.into_iter().find(|option| option.api_value() == value)
    }

    /// Query parameter and token sent to the search API
    pub fn query_param(self) -> (DietParam, &'static str) {
        match self {
            DietOption::Keto => (DietParam::Health, "keto-friendly"),
            DietOption::Vegan
            | DietOption::Vegetarian
            | DietOption::GlutenFree
            | DietOption::DairyFree => (DietParam::Health, self.api_value()),
            _ => (DietParam::Diet, self.api_value()),
        }
    }
}

/// Search constraints built for a single request
#[derive(Debug, Clone, PartialEq)]
pub struct MealConstraints {
    pub meal_type: MealType,
    pub max_calories: u32,
    pub health_constraints: Vec<String>,
}

impl Default for MealConstraints {
    fn default() -> Self {
        Self {
            meal_type: MealType::Dinner,
            max_calories: 1000,
            health_constraints: Vec::new(),
        }
    }
}
