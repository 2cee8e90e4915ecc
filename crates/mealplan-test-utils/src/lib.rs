//! Shared test utilities for mealplan integration tests.
//!
//! Provides:
//! - temporary file-backed stores that clean up on drop;
//! - [`FailingStore`], a backend whose writes always fail;
//! - a fake TheMealDB HTTP server bound to an ephemeral local port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use mealplan_store::{FileStore, KeyValueStore, MemoryStore, StorageError};

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Create a [`FileStore`] rooted in a fresh temp directory.
///
/// Keep the returned [`TempDir`] alive for as long as the store is used.
pub fn temp_file_store() -> (TempDir, FileStore) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let store = FileStore::new(tmp.path().join("data"));
    (tmp, store)
}

/// Backend that reads from an inner [`MemoryStore`] but rejects every write.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub attempts: usize,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner, attempts: 0 }
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.attempts += 1;
        Err(StorageError::Unavailable("disk full".to_string()))
    }
}

/// Backend whose reads always fail.
#[derive(Debug, Default)]
pub struct UnreadableStore;

impl KeyValueStore for UnreadableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("permission denied".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake recipe API
// ---------------------------------------------------------------------------

/// A TheMealDB-shaped meal record with `ingredients` as
/// `(ingredient, measure)` pairs spread across the numbered fields.
pub fn meal_json(id: &str, name: &str, ingredients: &[(&str, &str)], instructions: &str) -> Value {
    let mut meal = serde_json::Map::new();
    meal.insert("idMeal".into(), json!(id));
    meal.insert("strMeal".into(), json!(name));
    meal.insert(
        "strMealThumb".into(),
        json!(format!("https://img.example/{id}.jpg")),
    );
    meal.insert("strInstructions".into(), json!(instructions));
    for n in 1..=20 {
        let (ingredient, measure) = ingredients
            .get(n - 1)
            .map(|(i, m)| (json!(i), json!(m)))
            .unwrap_or((json!(""), Value::Null));
        meal.insert(format!("strIngredient{n}"), ingredient);
        meal.insert(format!("strMeasure{n}"), measure);
    }
    Value::Object(meal)
}

/// A small canned catalogue.
pub fn sample_meals() -> Vec<Value> {
    vec![
        meal_json(
            "52772",
            "Teriyaki Chicken Casserole",
            &[("soy sauce", "3/4 cup"), ("water", "1/2 cup"), ("brown sugar", "1/4 cup")],
            "Preheat oven to 350F.",
        ),
        meal_json(
            "52795",
            "Chicken Handi",
            &[("Chicken", "1.2 kg"), ("Onion", "5 thinly sliced")],
            "Take a large pot.",
        ),
        meal_json(
            "52959",
            "Baked salmon with fennel & tomatoes",
            &[("Fennel", "2 medium"), ("Salmon", "2 fillets")],
            "Heat oven to 180C.",
        ),
    ]
}

/// How the fake server answers.
#[derive(Debug, Clone)]
pub enum FakeMode {
    /// Serve the catalogue.
    Catalogue(Vec<Value>),
    /// Answer every request with HTTP 500.
    ServerError,
    /// Answer every request with a body that is not JSON.
    Garbage,
}

/// Handle to a running fake server. The server stops when dropped.
pub struct FakeMealDb {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for FakeMealDb {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a fake recipe API serving `mode` on `127.0.0.1:<ephemeral>`.
pub async fn spawn_fake_mealdb(mode: FakeMode) -> FakeMealDb {
    let app = Router::new()
        .route("/search.php", get(search))
        .route("/lookup.php", get(lookup))
        .with_state(Arc::new(mode));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake server");
    let addr: SocketAddr = listener.local_addr().expect("no local addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    FakeMealDb {
        base_url: format!("http://{addr}"),
        handle,
    }
}

type Params = Query<HashMap<String, String>>;

async fn search(State(mode): State<Arc<FakeMode>>, Query(params): Params) -> Response {
    let query = params.get("s").cloned().unwrap_or_default().to_lowercase();
    respond(&mode, |meals| {
        meals
            .iter()
            .filter(|m| {
                m["strMeal"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    })
}

async fn lookup(State(mode): State<Arc<FakeMode>>, Query(params): Params) -> Response {
    let id = params.get("i").cloned().unwrap_or_default();
    respond(&mode, |meals| {
        meals
            .iter()
            .filter(|m| m["idMeal"].as_str() == Some(id.as_str()))
            .cloned()
            .collect()
    })
}

fn respond(mode: &FakeMode, select: impl FnOnce(&[Value]) -> Vec<Value>) -> Response {
    match mode {
        FakeMode::Catalogue(meals) => {
            let found = select(meals);
            let body = if found.is_empty() {
                json!({ "meals": null })
            } else {
                json!({ "meals": found })
            };
            Json(body).into_response()
        }
        FakeMode::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        FakeMode::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}
