//! Edamam Recipe Search v2 wire format
//!
//! Search responses are requested with a narrow `field` selection and only
//! identify recipes; the full record comes from the detail endpoint
//! (`GET {base}/{id}`). Edamam sends `null` for absent values, so every
//! field is optional here and defaulted during conversion.

use crate::models::{
    hyphenate, normalize_name, DietOption, DietParam, HealthConstraint, MealConstraints, MealModel,
};
use serde::Deserialize;

/// Top-level search response
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// One search result, before detail enrichment
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub recipe: HitRecipe,
}

#[derive(Debug, Deserialize)]
pub struct HitRecipe {
    pub uri: String,
    pub label: Option<String>,
    /// Only present when requested with `field=ingredients`
    pub ingredients: Option<Vec<WireIngredient>>,
}

/// Detail endpoint response
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub recipe: WireRecipe,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecipe {
    pub uri: String,
    pub label: Option<String>,
    pub image: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "yield")]
    pub servings: Option<f64>,
    pub calories: Option<f64>,
    pub total_time: Option<f64>,
    pub meal_type: Option<Vec<String>>,
    pub diet_labels: Option<Vec<String>>,
    pub health_labels: Option<Vec<String>>,
    pub ingredient_lines: Option<Vec<String>>,
    pub ingredients: Option<Vec<WireIngredient>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireIngredient {
    pub text: Option<String>,
    /// Clean food name, e.g. "chicken breast"
    pub food: Option<String>,
}

/// Recipe id used by the detail endpoint: the URI fragment after the last `_`
pub fn recipe_id_from_uri(uri: &str) -> &str {
    uri.rsplit_once('_').map_or(uri, |(_, id)| id)
}

impl From<WireRecipe> for MealModel {
    fn from(recipe: WireRecipe) -> Self {
        let (ingredients, ingredient_names) = ingredient_pairs(
            recipe.ingredients.unwrap_or_default(),
            recipe.ingredient_lines.unwrap_or_default(),
        );

        MealModel {
            id: recipe_id_from_uri(&recipe.uri).to_string(),
            label: recipe.label.unwrap_or_default(),
            image_url: recipe.image.unwrap_or_default(),
            url: recipe.url.unwrap_or_default(),
            source: recipe.source.unwrap_or_default(),
            servings: recipe.servings.unwrap_or_default(),
            calories: recipe.calories.unwrap_or_default(),
            total_time: recipe.total_time.unwrap_or_default(),
            meal_type: recipe.meal_type.unwrap_or_default(),
            diet_labels: recipe.diet_labels.unwrap_or_default(),
            health_labels: recipe.health_labels.unwrap_or_default(),
            ingredients,
            ingredient_names,
        }
    }
}

/// Build index-aligned description lines and clean names
fn ingredient_pairs(
    structured: Vec<WireIngredient>,
    lines: Vec<String>,
) -> (Vec<String>, Vec<String>) {
    if structured.is_empty() {
        let names = lines.iter().map(|line| normalize_name(line)).collect();
        return (lines, names);
    }

    structured
        .into_iter()
        .map(|ingredient| {
            let text = ingredient.text.unwrap_or_default();
            let name = match ingredient.food {
                Some(food) if !food.trim().is_empty() => normalize_name(&food),
                _ => normalize_name(&text),
            };
            (text, name)
        })
        .unzip()
}

/// Query parameters for a constraint-based search
pub fn search_params(constraints: &MealConstraints, selected_diet: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", "recipe".to_string()),
        ("mealType", constraints.meal_type.api_value().to_string()),
        ("calories", format!("0-{}", constraints.max_calories.saturating_mul(2))),
    ];

    let (param, token) = match DietOption::from_api_value(selected_diet) {
        Some(option) => {
            let (param, token) = option.query_param();
            (param, token.to_string())
        }
        None => (DietParam::Diet, selected_diet.trim().to_lowercase()),
    };
    if !token.is_empty() {
        params.push((param.name(), token));
    }

    for constraint in &constraints.health_constraints {
        let token = match HealthConstraint::from_label(constraint) {
            Some(known) => known.api_value().to_string(),
            None => hyphenate(constraint),
        };
        if !token.is_empty() {
            params.push(("health", token));
        }
    }

    params.push(("random", "true".to_string()));
    params
}

/// Number of a hit's ingredients not covered by `available` names
pub fn missing_ingredient_count(hit: &HitRecipe, available: &[String]) -> usize {
    hit.ingredients
        .iter()
        .flatten()
        .filter_map(|ingredient| ingredient.food.as_deref().or(ingredient.text.as_deref()))
        .map(normalize_name)
        .filter(|food| !food.is_empty())
        .filter(|food| {
            !available
                .iter()
                .any(|name| food.contains(name.as_str()) || name.contains(food.as_str()))
        })
        .count()
}
