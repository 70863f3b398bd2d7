//! Integration tests for the catalog client against a mock CMS API.

use serde_json::json;
use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vora::catalog::CatalogClient;
use vora::config::{CatalogConfig, RequestConfig};
use vora::error::CatalogError;

fn test_config(base_url: &str) -> CatalogConfig {
    CatalogConfig {
        base_url: base_url.to_string(),
        project_id: "test-project".to_string(),
        dataset: "production".to_string(),
        token: Some("test-token".to_string()),
    }
}

fn fast_retries() -> RequestConfig {
    RequestConfig {
        timeout_ms: 5000,
        max_retries: 2,
        retry_delay_ms: 10,
    }
}

fn product_json(id: &str, title: &str, stock: u32) -> serde_json::Value {
    json!({
        "_id": id,
        "title": title,
        "price": 80.0,
        "stock": stock,
        "category": "dresses",
        "tags": ["blue"],
        "emotionBoost": 0.3
    })
}

#[tokio::test]
async fn test_fetch_products_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [product_json("p1", "Blue Dress", 3), product_json("p2", "Red Top", 5)]
        })))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();
    let products = client.fetch_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "p1");
    assert_eq!(products[0].title, "Blue Dress");
    assert_eq!(products[0].emotion_boost, 0.3);
}

#[tokio::test]
async fn test_fetch_products_applies_default_boost() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{ "_id": "p1", "title": "Plain", "price": 10.0, "stock": 1 }]
        })))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();
    let products = client.fetch_products().await.unwrap();

    assert_eq!(products[0].emotion_boost, 0.15);
    assert!(products[0].tags.is_empty());
}

#[tokio::test]
async fn test_fetch_products_retries_then_succeeds() {
    let server = MockServer::start().await;

    // First attempt fails, retry succeeds.
    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [product_json("p1", "Blue Dress", 3)]
        })))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();
    let products = client.fetch_products().await.unwrap();

    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn test_fetch_products_unavailable_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();
    let result = client.fetch_products().await;

    match result {
        Err(CatalogError::Unavailable { retries, .. }) => assert_eq!(retries, 3),
        other => panic!("expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_products_invalid_body_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();
    let result = client.fetch_products().await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_decrement_stock_writes_floored_value() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .and(query_param_contains("query", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": product_json("p1", "Blue Dress", 3)
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2024-01-01/data/mutate/production"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();

    // Decrementing 5 from stock 3 floors at 0 rather than going negative.
    let new_stock = client.decrement_stock("p1", 5).await.unwrap();
    assert_eq!(new_stock, 0);
}

#[tokio::test]
async fn test_decrement_stock_unknown_product_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2024-01-01/data/query/production"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": null })))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&test_config(&server.uri()), fast_retries()).unwrap();
    let result = client.decrement_stock("ghost", 1).await;

    assert!(matches!(result, Err(CatalogError::InvalidResponse { .. })));
}
