use mealplan_store::{Category, EntryId, MealPlan};

use super::edit::EditSession;

/// Shown in place of rows when a category has no entries.
pub const EMPTY_PLACEHOLDER: &str = "No meals yet — add or search recipes!";

/// Action offered on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Save,
    Delete,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Save => "Save",
            Self::Delete => "Delete",
        }
    }
}

/// Per-row edit state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Viewing,
    Editing { draft: String },
}

/// One rendered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: EntryId,
    pub name: String,
    pub recipe_ref: Option<String>,
    pub state: RowState,
}

impl RowView {
    /// The two actions on this row. Edit turns into Save while editing.
    pub fn actions(&self) -> [RowAction; 2] {
        match self.state {
            RowState::Viewing => [RowAction::Edit, RowAction::Delete],
            RowState::Editing { .. } => [RowAction::Save, RowAction::Delete],
        }
    }

    /// Text displayed for the row: the draft while editing, else the name.
    pub fn text(&self) -> &str {
        match &self.state {
            RowState::Viewing => &self.name,
            RowState::Editing { draft } => draft,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, RowState::Editing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBody {
    Rows(Vec<RowView>),
    Empty { placeholder: &'static str },
}

/// A category header and its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub category: Category,
    pub count: usize,
    pub body: GroupBody,
}

impl GroupView {
    /// Header text, e.g. `Breakfast (2)`.
    pub fn header(&self) -> String {
        format!("{} ({})", self.category, self.count)
    }

    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            GroupBody::Rows(rows) => rows,
            GroupBody::Empty { .. } => &[],
        }
    }
}

/// The whole rendered plan, one group per category in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanListing {
    groups: Vec<GroupView>,
}

impl PlanListing {
    /// The four groups, in display order.
    pub fn groups(&self) -> &[GroupView] {
        &self.groups
    }

    pub fn group(&self, category: Category) -> &GroupView {
        // Only `render` builds listings, and it emits all four groups in
        // `Category::ALL` order.
        let idx = Category::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or_default();
        &self.groups[idx]
    }

    /// Every row across all groups, paired with its category.
    pub fn rows(&self) -> impl Iterator<Item = (Category, &RowView)> {
        self.groups
            .iter()
            .flat_map(|g| g.rows().iter().map(move |r| (g.category, r)))
    }

    pub fn row(&self, category: Category, id: &EntryId) -> Option<&RowView> {
        self.group(category).rows().iter().find(|r| &r.id == id)
    }

    pub fn editing_rows(&self) -> usize {
        self.rows().filter(|(_, r)| r.is_editing()).count()
    }
}

/// Build the listing for `plan`. Only the row matching `session` (if any)
/// is in the editing state.
pub fn render(plan: &MealPlan, session: Option<&EditSession>) -> PlanListing {
    let groups = plan
        .iter()
        .map(|(category, entries)| {
            let body = if entries.is_empty() {
                GroupBody::Empty {
                    placeholder: EMPTY_PLACEHOLDER,
                }
            } else {
                GroupBody::Rows(
                    entries
                        .iter()
                        .map(|entry| {
                            let state = match session {
                                Some(s) if s.targets(category, &entry.id) => RowState::Editing {
                                    draft: s.draft().to_owned(),
                                },
                                _ => RowState::Viewing,
                            };
                            RowView {
                                id: entry.id.clone(),
                                name: entry.name.clone(),
                                recipe_ref: entry.recipe_ref.clone(),
                                state,
                            }
                        })
                        .collect(),
                )
            };
            GroupView {
                category,
                count: entries.len(),
                body,
            }
        })
        .collect();

    PlanListing { groups }
}

#[cfg(test)]
mod tests {
    use mealplan_store::{MemoryStore, PlanStore};

    use super::*;

    #[test]
    fn empty_plan_renders_four_placeholder_groups() {
        let listing = render(&MealPlan::new(), None);
        assert_eq!(listing.groups().len(), 4);
        for (group, category) in listing.groups().iter().zip(Category::ALL) {
            assert_eq!(group.category, category);
            assert_eq!(group.count, 0);
            assert_eq!(
                group.body,
                GroupBody::Empty {
                    placeholder: EMPTY_PLACEHOLDER
                }
            );
        }
        assert_eq!(listing.groups()[2].header(), "Dinner (0)");
    }

    #[test]
    fn rows_follow_stored_order_with_counts() {
        let mut store = PlanStore::open(MemoryStore::new());
        store.add(Category::Lunch, "Soup").unwrap();
        store.add(Category::Lunch, "Salad").unwrap();
        store.add(Category::Snack, "Apple").unwrap();

        let listing = render(store.plan(), None);
        let lunch = listing.group(Category::Lunch);
        assert_eq!(lunch.header(), "Lunch (2)");
        let names: Vec<_> = lunch.rows().iter().map(|r| r.text()).collect();
        assert_eq!(names, vec!["Soup", "Salad"]);
        assert!(matches!(listing.group(Category::Breakfast).body, GroupBody::Empty { .. }));
        assert_eq!(listing.rows().count(), 3);
        for (_, row) in listing.rows() {
            assert_eq!(row.actions(), [RowAction::Edit, RowAction::Delete]);
        }
    }

    #[test]
    fn session_marks_only_its_row_as_editing() {
        let mut store = PlanStore::open(MemoryStore::new());
        let soup = store.add(Category::Lunch, "Soup").unwrap();
        store.add(Category::Lunch, "Salad").unwrap();

        let mut session = EditSession::new(Category::Lunch, &soup);
        session.set_draft("Tomato Soup");
        let listing = render(store.plan(), Some(&session));

        assert_eq!(listing.editing_rows(), 1);
        let row = listing.row(Category::Lunch, &soup.id).unwrap();
        assert_eq!(row.text(), "Tomato Soup");
        assert_eq!(row.name, "Soup");
        assert_eq!(row.actions(), [RowAction::Save, RowAction::Delete]);
    }

    #[test]
    fn group_lookup_matches_every_category() {
        let mut store = PlanStore::open(MemoryStore::new());
        store.add(Category::Snack, "Apple").unwrap();

        let listing = render(store.plan(), None);
        for category in Category::ALL {
            let group = listing.group(category);
            assert_eq!(group.category, category);
        }
        assert_eq!(listing.group(Category::Snack).header(), "Snack (1)");
        assert_eq!(listing.group(Category::Dinner).header(), "Dinner (0)");
    }
}
