use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Meal-time bucket an entry belongs to. The set is closed.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Category {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 4] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snack => "Snack",
        }
    }

    /// The following category in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Breakfast => Self::Lunch,
            Self::Lunch => Self::Dinner,
            Self::Dinner => Self::Snack,
            Self::Snack => Self::Breakfast,
        }
    }

    /// The preceding category in display order, wrapping around.
    pub fn prev(self) -> Self {
        match self {
            Self::Breakfast => Self::Snack,
            Self::Lunch => Self::Breakfast,
            Self::Dinner => Self::Lunch,
            Self::Snack => Self::Dinner,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            _ => Err(CategoryParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Category`] string.
#[derive(Debug, Clone)]
pub struct CategoryParseError(pub String);

impl fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid category: {:?} (expected breakfast, lunch, dinner, or snack)",
            self.0
        )
    }
}

impl std::error::Error for CategoryParseError {}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Opaque identifier of a [`MealEntry`].
///
/// Freshly minted ids are UUID v4 strings. Ids read back from storage are
/// kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A single planned item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: EntryId,
    pub name: String,
    /// Identifier of the external recipe this entry was imported from.
    #[serde(rename = "recipeRef", default, skip_serializing_if = "Option::is_none")]
    pub recipe_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The full plan: every category mapped to its entries in insertion order.
///
/// The four categories are fields rather than map keys, so a plan can never
/// be missing one. Serializes as the `{"Breakfast": [...], ...}` document
/// kept in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(rename = "Breakfast", default)]
    breakfast: Vec<MealEntry>,
    #[serde(rename = "Lunch", default)]
    lunch: Vec<MealEntry>,
    #[serde(rename = "Dinner", default)]
    dinner: Vec<MealEntry>,
    #[serde(rename = "Snack", default)]
    snack: Vec<MealEntry>,
}

impl MealPlan {
    /// A plan with four empty categories.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, category: Category) -> &[MealEntry] {
        match category {
            Category::Breakfast => &self.breakfast,
            Category::Lunch => &self.lunch,
            Category::Dinner => &self.dinner,
            Category::Snack => &self.snack,
        }
    }

    pub(crate) fn entries_mut(&mut self, category: Category) -> &mut Vec<MealEntry> {
        match category {
            Category::Breakfast => &mut self.breakfast,
            Category::Lunch => &mut self.lunch,
            Category::Dinner => &mut self.dinner,
            Category::Snack => &mut self.snack,
        }
    }

    /// Categories and their entries, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[MealEntry])> {
        Category::ALL.into_iter().map(|c| (c, self.entries(c)))
    }

    pub fn find(&self, category: Category, id: &EntryId) -> Option<&MealEntry> {
        self.entries(category).iter().find(|e| &e.id == id)
    }

    /// Locate an entry by id in any category.
    pub fn locate(&self, id: &EntryId) -> Option<(Category, &MealEntry)> {
        self.iter()
            .find_map(|(c, entries)| entries.iter().find(|e| &e.id == id).map(|e| (c, e)))
    }

    pub fn contains_id(&self, id: &EntryId) -> bool {
        self.locate(id).is_some()
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every id in the plan is distinct.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::new();
        self.iter()
            .flat_map(|(_, entries)| entries.iter())
            .all(|e| seen.insert(&e.id))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> MealEntry {
        MealEntry {
            id: EntryId::from(id),
            name: name.to_string(),
            recipe_ref: None,
        }
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("lunch".parse::<Category>().unwrap(), Category::Lunch);
        assert_eq!(" SNACK ".parse::<Category>().unwrap(), Category::Snack);
        assert_eq!("Dinner".parse::<Category>().unwrap(), Category::Dinner);
        let err = "brunch".parse::<Category>().unwrap_err();
        assert!(err.to_string().contains("brunch"));
    }

    #[test]
    fn category_cycles_in_display_order() {
        let mut c = Category::Breakfast;
        for expected in [Category::Lunch, Category::Dinner, Category::Snack, Category::Breakfast] {
            c = c.next();
            assert_eq!(c, expected);
        }
        assert_eq!(Category::Breakfast.prev(), Category::Snack);
    }

    #[test]
    fn default_category_is_the_first_in_display_order() {
        assert_eq!(Category::default(), Category::Breakfast);
        assert_eq!(Category::default(), Category::ALL[0]);
    }

    #[test]
    fn empty_plan_serializes_all_four_keys_in_order() {
        let json = MealPlan::new().to_json().unwrap();
        assert_eq!(json, r#"{"Breakfast":[],"Lunch":[],"Dinner":[],"Snack":[]}"#);
    }

    #[test]
    fn recipe_ref_is_omitted_when_absent() {
        let mut plan = MealPlan::new();
        plan.entries_mut(Category::Lunch).push(entry("a", "Soup"));
        plan.entries_mut(Category::Lunch).push(MealEntry {
            recipe_ref: Some("52772".to_string()),
            ..entry("b", "Teriyaki Chicken")
        });

        let value: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(value["Lunch"][0], serde_json::json!({"id": "a", "name": "Soup"}));
        assert_eq!(value["Lunch"][1]["recipeRef"], "52772");
    }

    #[test]
    fn missing_category_deserializes_empty() {
        let plan = MealPlan::from_json(r#"{"Dinner":[{"id":"1","name":"Stew"}]}"#).unwrap();
        assert!(plan.entries(Category::Breakfast).is_empty());
        assert_eq!(plan.entries(Category::Dinner)[0].name, "Stew");
    }

    #[test]
    fn locate_and_unique_ids() {
        let mut plan = MealPlan::new();
        plan.entries_mut(Category::Breakfast).push(entry("1", "Eggs"));
        plan.entries_mut(Category::Snack).push(entry("2", "Apple"));
        assert_eq!(plan.locate(&EntryId::from("2")).map(|(c, _)| c), Some(Category::Snack));
        assert!(plan.find(Category::Breakfast, &EntryId::from("2")).is_none());
        assert!(plan.has_unique_ids());

        plan.entries_mut(Category::Dinner).push(entry("1", "Stew"));
        assert!(!plan.has_unique_ids());
        assert_eq!(plan.len(), 3);
    }
}
