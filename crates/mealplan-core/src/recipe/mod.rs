//! External recipe collaborator.
//!
//! The plan never depends on this module: recipes only reach the plan as a
//! [`RecipeSelection`] handed to [`PlanView::import_recipe`](crate::PlanView::import_recipe).

mod mealdb;
mod search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mealdb::{MealDbClient, RecipeApiConfig};
pub use search::{DetailOverlay, RecipeDetailView, RecipeSearch, RequestTracker, SearchPanel, Ticket};

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub thumbnail: Option<String>,
}

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

/// Full recipe record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: String,
    pub name: String,
    pub thumbnail: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
}

/// What the plan receives when the user picks a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSelection {
    pub name: String,
    pub recipe_ref: Option<String>,
}

impl RecipeSelection {
    /// A selection with no recipe link.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recipe_ref: None,
        }
    }
}

impl From<&RecipeSummary> for RecipeSelection {
    fn from(summary: &RecipeSummary) -> Self {
        Self {
            name: summary.name.clone(),
            recipe_ref: Some(summary.id.clone()),
        }
    }
}

impl From<&RecipeDetail> for RecipeSelection {
    fn from(detail: &RecipeDetail) -> Self {
        Self {
            name: detail.name.clone(),
            recipe_ref: Some(detail.id.clone()),
        }
    }
}

/// Failures talking to a recipe service. "No results" is never an error.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("recipe service returned HTTP {0}")]
    Status(u16),

    #[error("unexpected recipe response: {0}")]
    Decode(String),
}

/// A source of recipes.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Recipes whose name matches `query`. No matches is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError>;

    /// The recipe with `id`, or `None` when the service does not know it.
    async fn lookup(&self, id: &str) -> Result<Option<RecipeDetail>, RecipeError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn RecipeSource) {}
};
