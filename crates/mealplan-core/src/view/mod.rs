//! Plan rendering and the interaction layer between the user and the store.
//!
//! [`render`] turns a plan snapshot into a grouped listing. [`PlanView`]
//! holds the one piece of transient UI state (the active edit session)
//! and turns user intents into [`PlanStore`](mealplan_store::PlanStore)
//! calls.

mod controller;
mod edit;
mod listing;

pub use controller::{CLEAR_PROMPT, Confirm, Notice, PlanView, ViewError};
pub use edit::EditSession;
pub use listing::{
    EMPTY_PLACEHOLDER, GroupBody, GroupView, PlanListing, RowAction, RowState, RowView, render,
};
