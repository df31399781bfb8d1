//! Integration tests for `StorefrontClient` against a wiremock server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pressroom_shopify::{normalize_product, ShopifyError, StorefrontClient};

fn test_client() -> StorefrontClient {
    StorefrontClient::new(5, "pressroom-test/0.1", 0, 0).expect("failed to build test client")
}

fn products_json(ids: &[i64]) -> serde_json::Value {
    let products: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "title": format!("Tea {id}"),
                "handle": format!("tea-{id}"),
                "body_html": "<p>Leaves</p>",
                "product_type": "Tea",
                "vendor": "Leafhouse",
                "tags": ["green"],
                "variants": [{
                    "id": id * 100,
                    "title": "Default Title",
                    "sku": "",
                    "price": "12.99",
                    "compare_at_price": null,
                    "available": true,
                    "position": 1
                }]
            })
        })
        .collect();
    json!({ "products": products })
}

#[tokio::test]
async fn single_page_feed_is_returned_and_normalizes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("limit", "250"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_json(&[1, 2])))
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client()
        .fetch_all_products(&server.uri(), 250, 0)
        .await
        .expect("feed should load");
    assert_eq!(products.len(), 2);

    let normalized = products
        .into_iter()
        .map(|p| normalize_product(p, &server.uri(), "USD"))
        .collect::<Result<Vec<_>, _>>()
        .expect("products should normalize");
    assert_eq!(normalized[0].source_product_id, "1");
    assert_eq!(normalized[0].variants[0].source_variant_id, "100");
    assert!(normalized[0].variants[0].sku.is_none());
    assert_eq!(
        normalized[1].source_url.as_deref(),
        Some(format!("{}/products/tea-2", server.uri()).as_str())
    );
}

#[tokio::test]
async fn follows_next_cursor_across_pages() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}/products.json?limit=1&page_info=abc123>; rel=\"next\"",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("page_info", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_json(&[2])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(products_json(&[1]))
                .insert_header("link", next.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client()
        .fetch_all_products(&server.uri(), 1, 0)
        .await
        .expect("both pages should load");
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn later_page_failure_discards_earlier_pages() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}/products.json?limit=1&page_info=broken>; rel=\"next\"",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("page_info", "broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(products_json(&[1]))
                .insert_header("link", next.as_str()),
        )
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_all_products(&server.uri(), 1, 0)
        .await
        .expect_err("second page fails");
    assert!(matches!(err, ShopifyError::UnexpectedStatus { status: 500, .. }));
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = StorefrontClient::new(5, "pressroom-test/0.1", 3, 0).expect("client");
    let err = client
        .fetch_products_page(&server.uri(), 50, None)
        .await
        .expect_err("404 should fail");
    assert!(matches!(err, ShopifyError::NotFound { .. }));
}

#[tokio::test]
async fn rate_limit_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_json(&[7])))
        .mount(&server)
        .await;

    // Zero backoff base: any wait comes from the Retry-After header.
    let client = StorefrontClient::new(5, "pressroom-test/0.1", 2, 0).expect("client");
    let started = std::time::Instant::now();
    let (page, link) = client
        .fetch_products_page(&server.uri(), 50, None)
        .await
        .expect("retry should succeed");
    assert!(
        started.elapsed() >= std::time::Duration::from_secs(1),
        "retry did not wait for Retry-After"
    );
    assert_eq!(page.products.len(), 1);
    assert!(link.is_none());
}

#[tokio::test]
async fn rate_limit_without_retries_surfaces_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_products_page(&server.uri(), 50, None)
        .await
        .expect_err("429 should fail");
    assert!(matches!(
        err,
        ShopifyError::RateLimited {
            retry_after_secs: 17,
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_json_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>password page</html>"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_products_page(&server.uri(), 50, None)
        .await
        .expect_err("html body should not parse");
    assert!(matches!(err, ShopifyError::Deserialize { .. }));
}

#[tokio::test]
async fn fetch_catalog_skips_products_without_variants() {
    let server = MockServer::start().await;
    let mut feed = products_json(&[1, 2]);
    feed["products"][1]["variants"] = json!([]);

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = test_client()
        .fetch_catalog(&server.uri(), "CAD", 0)
        .await
        .expect("catalog should load");

    assert_eq!(catalog.products.len(), 1);
    assert_eq!(catalog.products[0].source_product_id, "1");
    assert_eq!(catalog.products[0].variants[0].currency_code, "CAD");
    assert_eq!(catalog.skipped, vec!["2".to_owned()]);
}
