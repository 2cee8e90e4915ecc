//! Meal-plan data model and its durable store.

pub mod config;
pub mod models;
pub mod plan_store;
pub mod storage;

pub use config::StoreConfig;
pub use models::{Category, CategoryParseError, EntryId, MealEntry, MealPlan};
pub use plan_store::{IdGenerator, PlanStore, STORAGE_KEY, SequentialIds, StoreError, UuidIds};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
