//! Integration tests for `AdminClient` against a wiremock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pressroom_shopify::{AdminClient, ArticleInput, CmsArticle, ShopifyError};

const GRAPHQL_PATH: &str = "/admin/api/2024-10/graphql.json";

fn test_client(server: &MockServer) -> AdminClient {
    AdminClient::new("tea.myshopify.com", "shpat_test", "2024-10", 5)
        .expect("failed to build admin client")
        .with_base_url(&server.uri())
        .with_storefront_url("https://tea.example.com")
}

fn sample_input() -> ArticleInput {
    let tags = vec!["green".to_owned()];
    ArticleInput::from_cms(
        Some("gid://shopify/Blog/1"),
        &CmsArticle {
            title: "Brewing Genmaicha",
            slug: "brewing-genmaicha",
            body_html: "<p>Use water at 80C.</p>",
            summary_html: Some("<p>How to brew it.</p>"),
            tags: &tags,
            author_name: None,
            featured_image_url: None,
            published: false,
            published_at: None,
        },
    )
}

#[tokio::test]
async fn list_blogs_sends_token_and_parses_nodes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "blogs": { "nodes": [
                { "id": "gid://shopify/Blog/1", "title": "News", "handle": "news" },
                { "id": "gid://shopify/Blog/2", "title": "Guides", "handle": "guides" }
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let blogs = test_client(&server).list_blogs().await.expect("blogs should load");
    assert_eq!(blogs.len(), 2);
    assert_eq!(blogs[1].handle, "guides");
}

#[tokio::test]
async fn create_article_returns_storefront_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({
            "variables": { "article": { "handle": "brewing-genmaicha", "isPublished": false } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "articleCreate": {
                "article": {
                    "id": "gid://shopify/Article/55",
                    "handle": "brewing-genmaicha",
                    "blog": { "handle": "news" }
                },
                "userErrors": []
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let article = test_client(&server)
        .create_article(&sample_input())
        .await
        .expect("article should be created");
    assert_eq!(article.id, "gid://shopify/Article/55");
    assert_eq!(article.blog_handle, "news");
    assert_eq!(
        article.url.as_deref(),
        Some("https://tea.example.com/blogs/news/brewing-genmaicha")
    );
}

#[tokio::test]
async fn user_errors_are_joined() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "articleUpdate": {
                "article": null,
                "userErrors": [{ "field": ["article", "handle"], "message": "has already been taken" }]
            }}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .update_article("gid://shopify/Article/55", &sample_input())
        .await
        .expect_err("user errors should fail");
    match err {
        ShopifyError::UserErrors(msg) => assert_eq!(msg, "article.handle: has already been taken"),
        other => panic!("expected UserErrors, got {other:?}"),
    }
}

#[tokio::test]
async fn top_level_errors_map_to_graphql_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Field 'blogz' doesn't exist on type 'QueryRoot'" }]
        })))
        .mount(&server)
        .await;

    let err = test_client(&server).list_blogs().await.expect_err("should fail");
    assert!(matches!(err, ShopifyError::GraphQl(ref m) if m.contains("blogz")));
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_retry(3, 0);
    let err = client.shop_name().await.expect_err("401 should fail");
    assert!(matches!(err, ShopifyError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn mutations_are_sent_once_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_retry(3, 0);
    let err = client
        .create_article(&sample_input())
        .await
        .expect_err("502 should fail");
    assert!(matches!(err, ShopifyError::UnexpectedStatus { status: 502, .. }));
}
