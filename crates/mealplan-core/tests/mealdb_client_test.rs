//! Integration tests for `MealDbClient` against a local fake recipe API.

use std::sync::Arc;
use std::time::Duration;

use mealplan_core::{MealDbClient, RecipeApiConfig, RecipeError, RecipeSearch, RecipeSource, SearchPanel};
use mealplan_test_utils::{FakeMode, sample_meals, spawn_fake_mealdb};

fn client(base_url: &str) -> MealDbClient {
    let config = RecipeApiConfig::new(base_url).with_timeout(Duration::from_secs(5));
    MealDbClient::new(config).expect("client should build")
}

#[tokio::test]
async fn search_returns_matching_summaries() {
    let server = spawn_fake_mealdb(FakeMode::Catalogue(sample_meals())).await;
    let hits = client(&server.base_url).search("chicken").await.unwrap();

    let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Teriyaki Chicken Casserole", "Chicken Handi"]);
    assert_eq!(hits[0].id, "52772");
    assert_eq!(hits[0].thumbnail.as_deref(), Some("https://img.example/52772.jpg"));
}

#[tokio::test]
async fn search_without_matches_is_empty_not_error() {
    let server = spawn_fake_mealdb(FakeMode::Catalogue(sample_meals())).await;
    let hits = client(&server.base_url).search("zzzz").await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn lookup_decodes_ingredients_in_order() {
    let server = spawn_fake_mealdb(FakeMode::Catalogue(sample_meals())).await;
    let detail = client(&server.base_url).lookup("52772").await.unwrap().unwrap();

    assert_eq!(detail.name, "Teriyaki Chicken Casserole");
    let pairs: Vec<_> = detail
        .ingredients
        .iter()
        .map(|i| (i.name.as_str(), i.measure.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("soy sauce", "3/4 cup"), ("water", "1/2 cup"), ("brown sugar", "1/4 cup")]
    );
    assert_eq!(detail.instructions, "Preheat oven to 350F.");
}

#[tokio::test]
async fn lookup_unknown_id_is_none() {
    let server = spawn_fake_mealdb(FakeMode::Catalogue(sample_meals())).await;
    assert!(client(&server.base_url).lookup("1").await.unwrap().is_none());
}

#[tokio::test]
async fn server_error_is_status_error() {
    let server = spawn_fake_mealdb(FakeMode::ServerError).await;
    let err = client(&server.base_url).search("chicken").await.unwrap_err();
    assert!(matches!(err, RecipeError::Status(500)), "got {err:?}");
}

#[tokio::test]
async fn garbage_body_is_decode_error() {
    let server = spawn_fake_mealdb(FakeMode::Garbage).await;
    let err = client(&server.base_url).lookup("52772").await.unwrap_err();
    assert!(matches!(err, RecipeError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let server = spawn_fake_mealdb(FakeMode::ServerError).await;
    let base_url = server.base_url.clone();
    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = client(&base_url).search("chicken").await.unwrap_err();
    assert!(matches!(err, RecipeError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn search_region_driven_through_trait_object() {
    let server = spawn_fake_mealdb(FakeMode::Catalogue(sample_meals())).await;
    let source: Arc<dyn RecipeSource> = Arc::new(client(&server.base_url));
    let mut search = RecipeSearch::new();

    let (query, ticket) = search.begin("salmon").unwrap();
    let result = ticket.run(source.search(&query)).await.expect("not cancelled");
    assert!(search.complete(ticket.seq(), result));

    match search.panel() {
        SearchPanel::Results(items) => assert_eq!(items[0].id, "52959"),
        other => panic!("unexpected panel: {other:?}"),
    }
}
