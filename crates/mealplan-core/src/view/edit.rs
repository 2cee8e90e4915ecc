use mealplan_store::{Category, EntryId, MealEntry};

/// An in-progress rename of one row.
///
/// Holds the stored name alongside the draft so a cancelled edit can show
/// the original again without consulting the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    category: Category,
    id: EntryId,
    original: String,
    draft: String,
}

impl EditSession {
    /// Start editing `entry`, with the field pre-filled with its name.
    pub fn new(category: Category, entry: &MealEntry) -> Self {
        Self {
            category,
            id: entry.id.clone(),
            original: entry.name.clone(),
            draft: entry.name.clone(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Whether this session edits the given row.
    pub fn targets(&self, category: Category, id: &EntryId) -> bool {
        self.category == category && &self.id == id
    }
}
