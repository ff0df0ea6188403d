//! Recipe search client
//!
//! Turns meal constraints or an ingredient list into Edamam searches.
//! Every search is two steps: a lightweight search for recipe ids, then a
//! detail fetch per chosen hit.
//!
//! The fetch status is published on a watch channel. It flips to
//! `Fetching` when a call starts and is reset by a drop guard, so every way
//! out of a call (success, any error, a dropped future) clears it.

use crate::config::RecipeApiConfig;
use crate::error::{AppError, NetworkError, NetworkErrorKind};
use crate::models::{normalize_name, MealConstraints, MealModel};
use crate::services::edamam::{
    self, recipe_id_from_uri, DetailResponse, SearchHit, SearchResponse,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

/// State of the most recent search call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching,
    Succeeded,
    Failed(NetworkErrorKind),
}

type SearchResult<T> = std::result::Result<T, NetworkError>;

/// Client for the recipe search API
pub struct RecipeSearchClient {
    config: RecipeApiConfig,
    http_client: reqwest::Client,
    status: watch::Sender<FetchStatus>,
}

impl RecipeSearchClient {
    pub fn new(config: RecipeApiConfig) -> crate::error::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Planitry/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Generic(format!("Failed to create HTTP client: {}", e)))?;

        let (status, _) = watch::channel(FetchStatus::Idle);
        Ok(Self {
            config,
            http_client,
            status,
        })
    }

    /// True while a search call is in flight
    pub fn is_fetching(&self) -> bool {
        *self.status.borrow() == FetchStatus::Fetching
    }

    pub fn status(&self) -> FetchStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchStatus> {
        self.status.subscribe()
    }

    /// Fetch one random recipe matching the constraints
    pub async fn fetch_meal(
        &self,
        constraints: &MealConstraints,
        selected_diet: &str,
    ) -> SearchResult<MealModel> {
        let guard = FetchGuard::start(&self.status);

        let result = async {
            let hits = self.search(constraints, selected_diet).await?;
            let hit = hits.into_iter().next().ok_or(NetworkError::NoResultsFound)?;
            self.fetch_detail(&hit.recipe.uri).await
        }
        .await;

        guard.finish(result)
    }

    /// Fetch up to `count` recipes matching the constraints.
    ///
    /// Hits whose detail fetch fails are skipped; only an empty result is
    /// an error.
    pub async fn fetch_meals(
        &self,
        constraints: &MealConstraints,
        selected_diet: &str,
        count: usize,
    ) -> SearchResult<Vec<MealModel>> {
        let guard = FetchGuard::start(&self.status);

        let result = async {
            if count == 0 {
                return Err(NetworkError::InvalidRequest(
                    "result count must be at least 1".to_string(),
                ));
            }

            let hits = self.search(constraints, selected_diet).await?;
            if hits.is_empty() {
                return Err(NetworkError::NoResultsFound);
            }

            let mut meals = Vec::with_capacity(count.min(hits.len()));
            for hit in hits.into_iter().take(count) {
                match self.fetch_detail(&hit.recipe.uri).await {
                    Ok(meal) => meals.push(meal),
                    Err(e) => tracing::warn!("Skipping recipe {}: {}", hit.recipe.uri, e),
                }
            }

            if meals.is_empty() {
                return Err(NetworkError::NoResultsFound);
            }

            tracing::info!("Fetched {} of {} requested recipes", meals.len(), count);
            Ok(meals)
        }
        .await;

        guard.finish(result)
    }

    /// Fetch the recipe that needs the fewest ingredients beyond `ingredients`
    pub async fn fetch_recipe_by_ingredients(
        &self,
        ingredients: &[String],
    ) -> SearchResult<MealModel> {
        let guard = FetchGuard::start(&self.status);

        let result = async {
            let available: Vec<String> = ingredients
                .iter()
                .map(|name| normalize_name(name))
                .filter(|name| !name.is_empty())
                .collect();

            if available.is_empty() {
                return Err(NetworkError::InvalidRequest(
                    "no ingredients to search with".to_string(),
                ));
            }

            let mut query = vec![("q", available.join(", "))];
            query.extend(Self::hit_fields(true));

            let response: SearchResponse = self.get_json(self.search_url()?, &query).await?;

            let best = response
                .hits
                .into_iter()
                .min_by_key(|hit| edamam::missing_ingredient_count(&hit.recipe, &available))
                .ok_or(NetworkError::NoResultsFound)?;

            tracing::debug!(
                "Best inventory match {} misses {} ingredients",
                best.recipe.uri,
                edamam::missing_ingredient_count(&best.recipe, &available)
            );

            self.fetch_detail(&best.recipe.uri).await
        }
        .await;

        guard.finish(result)
    }

    async fn search(
        &self,
        constraints: &MealConstraints,
        selected_diet: &str,
    ) -> SearchResult<Vec<SearchHit>> {
        let mut query = edamam::search_params(constraints, selected_diet);
        query.extend(Self::hit_fields(false));

        tracing::info!(
            "Searching recipes: meal type {}, diet {}, calories up to {}, health [{}]",
            constraints.meal_type.api_value(),
            selected_diet,
            constraints.max_calories.saturating_mul(2),
            constraints.health_constraints.join(", ")
        );

        let response: SearchResponse = self.get_json(self.search_url()?, &query).await?;
        tracing::debug!("Search returned {} hits", response.hits.len());

        Ok(response.hits)
    }

    async fn fetch_detail(&self, uri: &str) -> SearchResult<MealModel> {
        let id = recipe_id_from_uri(uri);
        let response: DetailResponse = self.get_json(self.detail_url(id)?, &[]).await?;
        Ok(MealModel::from(response.recipe))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> SearchResult<T> {
        tracing::debug!("GET {}", url.path());

        let response = self
            .http_client
            .get(url)
            .query(&[
                ("type", "public"),
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
            ])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Recipe API request failed: {}", e);
                NetworkError::InvalidResponse(None)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Recipe API returned status: {}", status);
            return Err(NetworkError::InvalidResponse(Some(status.as_u16())));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read recipe API response: {}", e);
            NetworkError::InvalidResponse(None)
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("Failed to parse recipe API response: {}", e);
            NetworkError::Decoding(e)
        })
    }

    fn hit_fields(with_ingredients: bool) -> Vec<(&'static str, String)> {
        let mut fields = vec![("field", "uri".to_string()), ("field", "label".to_string())];
        if with_ingredients {
            fields.push(("field", "ingredients".to_string()));
        }
        fields
    }

    fn search_url(&self) -> SearchResult<Url> {
        Url::parse(&self.config.base_url).map_err(|e| {
            tracing::error!("Invalid recipe API base URL {}: {}", self.config.base_url, e);
            NetworkError::InvalidUrl
        })
    }

    fn detail_url(&self, id: &str) -> SearchResult<Url> {
        if id.trim().is_empty() {
            return Err(NetworkError::InvalidUrl);
        }

        let mut url = self.search_url()?;
        url.path_segments_mut()
            .map_err(|_| NetworkError::InvalidUrl)?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

/// Marks a call as fetching for as long as it lives
struct FetchGuard<'a> {
    status: &'a watch::Sender<FetchStatus>,
    outcome: FetchStatus,
}

impl<'a> FetchGuard<'a> {
    fn start(status: &'a watch::Sender<FetchStatus>) -> Self {
        status.send_replace(FetchStatus::Fetching);
        Self {
            status,
            outcome: FetchStatus::Idle,
        }
    }

    fn finish<T>(mut self, result: SearchResult<T>) -> SearchResult<T> {
        self.outcome = match &result {
            Ok(_) => FetchStatus::Succeeded,
            Err(e) => {
                tracing::warn!("Recipe search failed: {}", e);
                FetchStatus::Failed(e.kind())
            }
        };
        result
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.status.send_replace(self.outcome);
    }
}
