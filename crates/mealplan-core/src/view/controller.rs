use std::fmt;

use thiserror::Error;
use tracing::debug;

use mealplan_store::{Category, EntryId, KeyValueStore, MealPlan, PlanStore, StoreError};

use super::edit::EditSession;
use super::listing::{PlanListing, render};
use crate::recipe::RecipeSelection;

/// Prompt shown before the whole plan is cleared.
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear the whole plan?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Short message for the user after an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MealAdded,
    EnterMealName,
    Saved,
    NameCannotBeEmpty,
    MealDeleted,
    PlanCleared,
    ClearDeclined,
    ResultsCleared,
    RecipeAdded { name: String, category: Category },
}

impl Notice {
    /// Whether the interaction was refused (nothing changed).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::EnterMealName | Self::NameCannotBeEmpty | Self::ClearDeclined
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MealAdded => f.write_str("Meal added"),
            Self::EnterMealName => f.write_str("Enter a meal name"),
            Self::Saved => f.write_str("Saved"),
            Self::NameCannotBeEmpty => f.write_str("Name cannot be empty"),
            Self::MealDeleted => f.write_str("Meal deleted"),
            Self::PlanCleared => f.write_str("Plan cleared"),
            Self::ClearDeclined => f.write_str("Plan left unchanged"),
            Self::ResultsCleared => f.write_str("Results cleared"),
            Self::RecipeAdded { name, category } => write!(f, "Added {name:?} to {category}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("no edit in progress")]
    NotEditing,

    #[error("no {category} entry with id {id}")]
    UnknownEntry { category: Category, id: EntryId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Interaction state for a rendered plan.
///
/// At most one row is ever being edited. Any successful store mutation
/// rebuilds the listing from scratch, which ends the active edit session.
#[derive(Debug, Default)]
pub struct PlanView {
    session: Option<EditSession>,
}

impl PlanView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `plan` with the current edit session applied.
    pub fn render(&self, plan: &MealPlan) -> PlanListing {
        render(plan, self.session.as_ref())
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    // -- Add --

    pub fn add<S: KeyValueStore>(
        &mut self,
        store: &mut PlanStore<S>,
        category: Category,
        name: &str,
    ) -> Result<Notice, ViewError> {
        match store.add(category, name) {
            Ok(_) => {
                self.rerender();
                Ok(Notice::MealAdded)
            }
            Err(StoreError::EmptyName) => Ok(Notice::EnterMealName),
            Err(e) => Err(e.into()),
        }
    }

    /// Add a recipe picked from search results, exactly like a typed entry
    /// with the recipe reference attached.
    pub fn import_recipe<S: KeyValueStore>(
        &mut self,
        store: &mut PlanStore<S>,
        category: Category,
        selection: RecipeSelection,
    ) -> Result<Notice, ViewError> {
        match store.add_with_recipe(category, &selection.name, selection.recipe_ref) {
            Ok(entry) => {
                self.rerender();
                Ok(Notice::RecipeAdded {
                    name: entry.name,
                    category,
                })
            }
            Err(StoreError::EmptyName) => Ok(Notice::EnterMealName),
            Err(e) => Err(e.into()),
        }
    }

    // -- Edit protocol --

    /// `Viewing -> Editing` for the given row. Any other row being edited
    /// is cancelled first, discarding its draft.
    pub fn begin_edit(
        &mut self,
        plan: &MealPlan,
        category: Category,
        id: &EntryId,
    ) -> Result<&mut EditSession, ViewError> {
        let entry = plan
            .find(category, id)
            .ok_or_else(|| ViewError::UnknownEntry {
                category,
                id: id.clone(),
            })?;

        if let Some(previous) = self.session.take() {
            debug!(id = %previous.id(), "edit force-cancelled by another edit");
        }
        Ok(self.session.insert(EditSession::new(category, entry)))
    }

    /// The field text of the active session, for typing into.
    pub fn draft_mut(&mut self) -> Option<&mut String> {
        self.session.as_mut().map(EditSession::draft_mut)
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<(), ViewError> {
        let session = self.session.as_mut().ok_or(ViewError::NotEditing)?;
        session.set_draft(text);
        Ok(())
    }

    /// `Editing -> Viewing` via rename. A blank draft is refused and the
    /// row stays in editing.
    pub fn save_edit<S: KeyValueStore>(
        &mut self,
        store: &mut PlanStore<S>,
    ) -> Result<Notice, ViewError> {
        let session = self.session.as_ref().ok_or(ViewError::NotEditing)?;
        if session.draft().trim().is_empty() {
            return Ok(Notice::NameCannotBeEmpty);
        }

        match store.rename(session.category(), session.id(), session.draft()) {
            Ok(()) => {
                self.rerender();
                Ok(Notice::Saved)
            }
            Err(e @ StoreError::EntryNotFound { .. }) => {
                self.session = None;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `Editing -> Viewing` without touching the store. Returns whether a
    /// session was active.
    pub fn cancel_edit(&mut self) -> bool {
        self.session.take().is_some()
    }

    // -- Delete / clear --

    /// Remove the row immediately. No confirmation.
    pub fn delete<S: KeyValueStore>(
        &mut self,
        store: &mut PlanStore<S>,
        category: Category,
        id: &EntryId,
    ) -> Result<Notice, ViewError> {
        store.remove(category, id)?;
        self.rerender();
        Ok(Notice::MealDeleted)
    }

    /// Clear the whole plan once `confirmer` agrees.
    pub fn clear<S: KeyValueStore, C: Confirm + ?Sized>(
        &mut self,
        store: &mut PlanStore<S>,
        confirmer: &mut C,
    ) -> Result<Notice, ViewError> {
        if !confirmer.confirm(CLEAR_PROMPT) {
            return Ok(Notice::ClearDeclined);
        }
        store.clear()?;
        self.rerender();
        Ok(Notice::PlanCleared)
    }

    fn rerender(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(id = %session.id(), "edit discarded by re-render");
        }
    }
}

#[cfg(test)]
mod tests {
    use mealplan_store::MemoryStore;

    use super::*;

    #[test]
    fn notices_render_user_text() {
        assert_eq!(Notice::Saved.to_string(), "Saved");
        assert_eq!(
            Notice::RecipeAdded {
                name: "Chicken Handi".into(),
                category: Category::Dinner
            }
            .to_string(),
            "Added \"Chicken Handi\" to Dinner"
        );
        assert!(Notice::NameCannotBeEmpty.is_rejection());
        assert!(!Notice::MealDeleted.is_rejection());
        assert_eq!(Notice::ResultsCleared.to_string(), "Results cleared");
        assert!(!Notice::ResultsCleared.is_rejection());
    }

    #[test]
    fn closures_confirm() {
        let mut asked = None;
        let mut confirmer = |prompt: &str| {
            asked = Some(prompt.to_owned());
            false
        };
        assert!(!confirmer.confirm(CLEAR_PROMPT));
        assert_eq!(asked.as_deref(), Some(CLEAR_PROMPT));
    }

    #[test]
    fn save_without_session_is_an_error() {
        let mut store = PlanStore::open(MemoryStore::new());
        let mut view = PlanView::new();
        assert!(matches!(view.save_edit(&mut store), Err(ViewError::NotEditing)));
        assert!(!view.cancel_edit());
    }
}
