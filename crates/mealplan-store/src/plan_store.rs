//! The meal-plan store.
//!
//! [`PlanStore`] is the only writer of a [`MealPlan`]. Each mutation is
//! built on a copy of the current plan, written to storage, and only then
//! committed in memory, so a failed write leaves the last-good plan in
//! place.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Category, EntryId, MealEntry, MealPlan};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key the plan document lives under.
pub const STORAGE_KEY: &str = "mealPlan";

/// Errors returned by [`PlanStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("meal name must not be empty")]
    EmptyName,

    #[error("no {category} entry with id {id}")]
    EntryNotFound { category: Category, id: EntryId },

    #[error("failed to serialize meal plan: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Whether this is a validation rejection rather than a storage fault.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::EmptyName | Self::EntryNotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Source of fresh entry ids. Implementations must never repeat an id.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> EntryId;
}

/// Random UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> EntryId {
        EntryId::random()
    }
}

/// Monotonic `<prefix><n>` ids. Deterministic, handy for fixtures.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> EntryId {
        let id = EntryId::from(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owner of the in-memory plan and its durable copy.
pub struct PlanStore<S> {
    storage: S,
    plan: MealPlan,
    ids: Box<dyn IdGenerator>,
}

impl<S: KeyValueStore> PlanStore<S> {
    /// Open a store over `storage`, loading whatever plan it holds.
    pub fn open(storage: S) -> Self {
        Self::open_with_ids(storage, Box::new(UuidIds))
    }

    /// Open a store with a custom id source.
    pub fn open_with_ids(storage: S, mut ids: Box<dyn IdGenerator>) -> Self {
        let plan = load_from(&storage, ids.as_mut());
        Self { storage, plan, ids }
    }

    /// Read the plan from storage. Never fails: a missing, unreadable or
    /// malformed document yields the empty four-category plan.
    pub fn load(&mut self) -> MealPlan {
        load_from(&self.storage, self.ids.as_mut())
    }

    /// Replace the in-memory plan with what storage currently holds.
    pub fn reload(&mut self) -> &MealPlan {
        self.plan = self.load();
        &self.plan
    }

    /// Current plan snapshot.
    pub fn plan(&self) -> &MealPlan {
        &self.plan
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Append a new entry named `name` to `category`.
    pub fn add(&mut self, category: Category, name: &str) -> Result<MealEntry, StoreError> {
        self.add_with_recipe(category, name, None)
    }

    /// Append a new entry, optionally linked to an external recipe.
    pub fn add_with_recipe(
        &mut self,
        category: Category,
        name: &str,
        recipe_ref: Option<String>,
    ) -> Result<MealEntry, StoreError> {
        let name = validate_name(name)?;
        let entry = MealEntry {
            id: self.fresh_id(),
            name: name.to_owned(),
            recipe_ref,
        };

        let mut next = self.plan.clone();
        next.entries_mut(category).push(entry.clone());
        self.commit(next)?;

        info!(category = %category, id = %entry.id, "meal added");
        Ok(entry)
    }

    /// Rename the entry `id` in `category`. Id and recipe link are kept.
    pub fn rename(
        &mut self,
        category: Category,
        id: &EntryId,
        new_name: &str,
    ) -> Result<(), StoreError> {
        let new_name = validate_name(new_name)?;

        let mut next = self.plan.clone();
        let entry = next
            .entries_mut(category)
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::EntryNotFound {
                category,
                id: id.clone(),
            })?;
        entry.name = new_name.to_owned();
        self.commit(next)?;

        info!(category = %category, id = %id, "meal renamed");
        Ok(())
    }

    /// Remove the entry `id` from `category` if present. Persists either way.
    pub fn remove(&mut self, category: Category, id: &EntryId) -> Result<(), StoreError> {
        let mut next = self.plan.clone();
        let entries = next.entries_mut(category);
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        let removed = entries.len() != before;
        self.commit(next)?;

        if removed {
            info!(category = %category, id = %id, "meal removed");
        } else {
            debug!(category = %category, id = %id, "remove of unknown id");
        }
        Ok(())
    }

    /// Replace the whole plan with four empty categories.
    pub fn clear(&mut self) -> Result<&MealPlan, StoreError> {
        self.commit(MealPlan::new())?;
        info!("meal plan cleared");
        Ok(&self.plan)
    }

    /// Write the in-memory plan to storage.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        write_plan(&mut self.storage, &self.plan)
    }

    fn commit(&mut self, next: MealPlan) -> Result<(), StoreError> {
        write_plan(&mut self.storage, &next)?;
        self.plan = next;
        Ok(())
    }

    fn fresh_id(&mut self) -> EntryId {
        loop {
            let id = self.ids.next_id();
            if !self.plan.contains_id(&id) {
                return id;
            }
            warn!(id = %id, "id generator produced an id already in the plan");
        }
    }
}

fn validate_name(name: &str) -> Result<&str, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(StoreError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

fn write_plan<S: KeyValueStore>(storage: &mut S, plan: &MealPlan) -> Result<(), StoreError> {
    let json = plan.to_json()?;
    storage.set(STORAGE_KEY, &json)?;
    Ok(())
}

fn load_from<S: KeyValueStore>(storage: &S, ids: &mut dyn IdGenerator) -> MealPlan {
    let raw = match storage.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no stored meal plan, starting empty");
            return MealPlan::new();
        }
        Err(e) => {
            warn!(error = %e, "failed to read stored meal plan, starting empty");
            return MealPlan::new();
        }
    };

    match MealPlan::from_json(&raw) {
        Ok(mut plan) => {
            let repairs = repair(&mut plan, ids);
            if repairs > 0 {
                warn!(repairs, "stored meal plan needed repair");
            }
            plan
        }
        Err(e) => {
            warn!(error = %e, "stored meal plan is malformed, starting empty");
            MealPlan::new()
        }
    }
}

/// Drop blank-named entries, trim padded names and re-mint ids that repeat
/// an earlier one. Returns the number of fixes applied.
fn repair(plan: &mut MealPlan, ids: &mut dyn IdGenerator) -> usize {
    let mut fixes = 0;

    for category in Category::ALL {
        let entries = plan.entries_mut(category);
        let before = entries.len();
        entries.retain(|e| !e.name.trim().is_empty());
        fixes += before - entries.len();

        for entry in entries.iter_mut() {
            let trimmed = entry.name.trim();
            if trimmed.len() != entry.name.len() {
                entry.name = trimmed.to_owned();
                fixes += 1;
            }
        }
    }

    let mut seen: HashSet<EntryId> = HashSet::new();
    let mut duplicates = Vec::new();
    for (category, entries) in plan.iter() {
        for (idx, entry) in entries.iter().enumerate() {
            if !seen.insert(entry.id.clone()) {
                duplicates.push((category, idx));
            }
        }
    }
    for (category, idx) in duplicates {
        let fresh = loop {
            let id = ids.next_id();
            if seen.insert(id.clone()) {
                break id;
            }
        };
        plan.entries_mut(category)[idx].id = fresh;
        fixes += 1;
    }

    fixes
}
