//! TheMealDB client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Ingredient, RecipeDetail, RecipeError, RecipeSource, RecipeSummary};

/// TheMealDB exposes at most this many numbered ingredient slots.
const INGREDIENT_SLOTS: usize = 20;

/// Recipe API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeApiConfig {
    /// Base URL without a trailing slash, e.g. `https://www.themealdb.com/api/json/v1/1`.
    pub base_url: String,
    pub timeout: Duration,
}

impl RecipeApiConfig {
    pub const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const BASE_URL_ENV: &str = "MEALPLAN_RECIPE_API";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// `MEALPLAN_RECIPE_API`, or the public endpoint.
    pub fn from_env() -> Self {
        Self::new(env::var(Self::BASE_URL_ENV).unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_owned()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for RecipeApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// HTTP client for TheMealDB's `search.php` and `lookup.php` endpoints.
#[derive(Debug, Clone)]
pub struct MealDbClient {
    http: reqwest::Client,
    config: RecipeApiConfig,
}

impl MealDbClient {
    pub fn new(config: RecipeApiConfig) -> Result<Self, RecipeError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RecipeApiConfig {
        &self.config
    }

    async fn get(&self, path: &str, param: (&str, &str)) -> Result<String, RecipeError> {
        let url = self.config.endpoint(path);
        debug!(%url, param = param.0, "recipe request");
        let response = self.http.get(&url).query(&[param]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RecipeError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl RecipeSource for MealDbClient {
    async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
        let body = self.get("search.php", ("s", query)).await?;
        decode_search(&body)
    }

    async fn lookup(&self, id: &str) -> Result<Option<RecipeDetail>, RecipeError> {
        let body = self.get("lookup.php", ("i", id)).await?;
        decode_lookup(&body)
    }
}

// ---------------------------------------------------------------------------
// Wire decoding
// ---------------------------------------------------------------------------

/// `{"meals": [...]}`, where `"meals": null` means nothing matched.
#[derive(Debug, Deserialize)]
struct Envelope {
    meals: Option<Vec<Map<String, Value>>>,
}

fn parse_envelope(body: &str) -> Result<Vec<Map<String, Value>>, RecipeError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| RecipeError::Decode(e.to_string()))?;
    Ok(envelope.meals.unwrap_or_default())
}

pub(crate) fn decode_search(body: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
    parse_envelope(body)?.iter().map(summary_from).collect()
}

pub(crate) fn decode_lookup(body: &str) -> Result<Option<RecipeDetail>, RecipeError> {
    parse_envelope(body)?.first().map(detail_from).transpose()
}

/// A string field; ids occasionally arrive as numbers.
fn text(meal: &Map<String, Value>, key: &str) -> Option<String> {
    match meal.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required(meal: &Map<String, Value>, key: &str) -> Result<String, RecipeError> {
    text(meal, key).ok_or_else(|| RecipeError::Decode(format!("meal record missing {key}")))
}

fn summary_from(meal: &Map<String, Value>) -> Result<RecipeSummary, RecipeError> {
    Ok(RecipeSummary {
        id: required(meal, "idMeal")?,
        name: required(meal, "strMeal")?,
        thumbnail: text(meal, "strMealThumb").filter(|s| !s.is_empty()),
    })
}

fn detail_from(meal: &Map<String, Value>) -> Result<RecipeDetail, RecipeError> {
    let summary = summary_from(meal)?;
    Ok(RecipeDetail {
        id: summary.id,
        name: summary.name,
        thumbnail: summary.thumbnail,
        ingredients: ingredients_from(meal),
        instructions: text(meal, "strInstructions").unwrap_or_default(),
    })
}

/// Collect `strIngredientN`/`strMeasureN` pairs in slot order, skipping
/// slots whose ingredient is blank.
fn ingredients_from(meal: &Map<String, Value>) -> Vec<Ingredient> {
    (1..=INGREDIENT_SLOTS)
        .filter_map(|n| {
            let name = text(meal, &format!("strIngredient{n}"))?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let measure = text(meal, &format!("strMeasure{n}")).unwrap_or_default();
            Some(Ingredient {
                name: name.to_owned(),
                measure: measure.trim().to_owned(),
            })
        })
        .collect()
}
