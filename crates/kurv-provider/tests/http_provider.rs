//! Integration tests for `HttpProductProvider`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the happy paths and every error variant
//! the provider methods can propagate.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kurv_core::Coordinates;
use kurv_provider::{HttpProductProvider, ProductProvider, ProviderError, SearchOptions};

/// Builds a provider suitable for tests: 5-second timeout, no retries.
fn test_provider(base_url: &str) -> HttpProductProvider {
    HttpProductProvider::new(base_url, 5, "kurv-test/0.1", 0, 0)
        .expect("failed to build test provider")
}

/// Builds a provider with retries enabled and zero backoff base.
fn test_provider_with_retries(base_url: &str, max_retries: u32) -> HttpProductProvider {
    HttpProductProvider::new(base_url, 5, "kurv-test/0.1", max_retries, 0)
        .expect("failed to build test provider")
}

fn one_product_json(id: &str, name: &str, price: f64) -> serde_json::Value {
    json!({
        "products": [{
            "id": id,
            "name": name,
            "price": price,
            "store": "Netto Østerbrogade",
            "chain": "Netto",
            "address": null,
            "image_url": null,
            "ingredients": []
        }]
    })
}

// ---------------------------------------------------------------------------
// search_products
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_returns_mapped_products() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .and(query_param("query", "mælk"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&one_product_json("p-1", "Mælk 1L", 8.95)),
        )
        .mount(&server)
        .await;

    let provider = test_provider(&server.uri());
    let products = provider
        .search_products("mælk", &SearchOptions::default())
        .await
        .expect("search should succeed");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "p-1");
    assert_eq!(products[0].store_label, "Netto Østerbrogade");
}

#[tokio::test]
async fn search_passes_chain_and_limit_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .and(query_param("query", "mælk"))
        .and(query_param("chain", "Netto"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"products": []})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = test_provider(&server.uri());
    let options = SearchOptions {
        chain: Some("Netto".to_string()),
        limit: Some(20),
    };
    let products = provider
        .search_products("mælk", &options)
        .await
        .expect("search should succeed");
    assert!(products.is_empty());
}

#[tokio::test]
async fn search_retries_on_429_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&one_product_json("p-2", "Mælk 1L", 9.5)),
        )
        .mount(&server)
        .await;

    let provider = test_provider_with_retries(&server.uri(), 2);
    let products = provider
        .search_products("mælk", &SearchOptions::default())
        .await
        .expect("retry should recover");
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn search_propagates_rate_limit_after_exhausting_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;

    let provider = test_provider_with_retries(&server.uri(), 1);
    let result = provider
        .search_products("mælk", &SearchOptions::default())
        .await;
    assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
}

#[tokio::test]
async fn search_malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = test_provider(&server.uri());
    let result = provider
        .search_products("mælk", &SearchOptions::default())
        .await;
    assert!(matches!(result, Err(ProviderError::Deserialize { .. })));
}

#[tokio::test]
async fn search_unexpected_client_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/search"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let provider = test_provider_with_retries(&server.uri(), 3);
    let result = provider
        .search_products("mælk", &SearchOptions::default())
        .await;
    assert!(
        matches!(result, Err(ProviderError::UnexpectedStatus { status: 403, .. })),
        "got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// get_stores_nearby
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stores_nearby_computes_distances() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "stores": [{
                "id": "netto-1",
                "name": "Netto Østerbrogade",
                "chain": "Netto",
                "address": "Østerbrogade 44",
                "lat": 55.7049,
                "lng": 12.5786
            }]
        })))
        .mount(&server)
        .await;

    let provider = test_provider(&server.uri());
    let user = Coordinates { lat: 55.6761, lng: 12.5683 };
    let stores = provider
        .get_stores_nearby(user, 5.0)
        .await
        .expect("stores call should succeed");

    assert_eq!(stores.len(), 1);
    assert!(stores[0].distance_from_user_m > 0.0);
}

// ---------------------------------------------------------------------------
// get_product_by_id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn product_by_id_maps_wire_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/p-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "id": "p-9",
            "name": "Lurpak Smør 200g",
            "price": 21.95,
            "store": "Føtex City",
            "chain": "Føtex"
        })))
        .mount(&server)
        .await;

    let provider = test_provider(&server.uri());
    let product = provider
        .get_product_by_id("p-9")
        .await
        .expect("lookup should succeed");
    assert_eq!(product.name, "Lurpak Smør 200g");
    assert_eq!(product.chain_label, "Føtex");
}

#[tokio::test]
async fn product_by_id_404_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/products/p-404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = test_provider(&server.uri());
    let result = provider.get_product_by_id("p-404").await;
    assert!(matches!(result, Err(ProviderError::NotFound { .. })));
}

// ---------------------------------------------------------------------------
// construction
// ---------------------------------------------------------------------------

#[test]
fn invalid_base_url_is_rejected() {
    let result = HttpProductProvider::new("not a url", 5, "kurv-test/0.1", 0, 0);
    assert!(matches!(result, Err(ProviderError::InvalidBaseUrl { .. })));
}
