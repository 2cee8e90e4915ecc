//! Meal-plan view model, edit protocol and recipe collaborator.

pub mod recipe;
pub mod view;

pub use recipe::{
    DetailOverlay, Ingredient, MealDbClient, RecipeApiConfig, RecipeDetail, RecipeDetailView,
    RecipeError, RecipeSearch, RecipeSelection, RecipeSource, RecipeSummary, RequestTracker,
    SearchPanel, Ticket,
};
pub use view::{
    CLEAR_PROMPT, Confirm, EMPTY_PLACEHOLDER, EditSession, GroupBody, GroupView, Notice,
    PlanListing, PlanView, RowAction, RowState, RowView, ViewError, render,
};
