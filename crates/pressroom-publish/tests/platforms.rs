//! Platform publishers against wiremock servers.

use pressroom_core::Platform;
use pressroom_publish::{
    ArticleContent, BlogPublisher, GhostPublisher, MediumPublisher, PublishError, PublishPost,
    ShopifyPublisher, WebflowPublisher, WordPressPublisher,
};
use pressroom_shopify::AdminClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "pressroom-test/0.1";
const GHOST_KEY: &str =
    "6489a1b2c3d4e5f6a7b8c9d0:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

fn post(draft: bool) -> PublishPost {
    let tags = vec!["Tea".to_owned(), "Green".to_owned()];
    PublishPost::from_article(
        &ArticleContent {
            title: "Brewing Genmaicha",
            slug: "brewing-genmaicha",
            body_markdown: "Use **80C** water.",
            excerpt: Some("How to brew it."),
            tags: &tags,
            canonical_url: Some("https://tea.example.com/blogs/news/brewing-genmaicha"),
            ..ArticleContent::default()
        },
        draft,
    )
}

#[tokio::test]
async fn wordpress_resolves_tags_and_creates_post() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(query_param("search", "Tea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "name": "Tea Ware" },
            { "id": 4, "name": "tea" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(query_param("search", "Green"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(body_partial_json(json!({ "name": "Green" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9, "name": "Green" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(header_regex("authorization", "^Basic "))
        .and(body_partial_json(json!({
            "slug": "brewing-genmaicha",
            "status": "publish",
            "tags": [4, 9],
            "content": "<p>Use <strong>80C</strong> water.</p>\n"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 321,
            "link": "https://wp.example.com/brewing-genmaicha/"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = WordPressPublisher::new(&server.uri(), "editor", "abcd efgh", 5, UA).unwrap();
    let remote = publisher.publish(&post(false)).await.unwrap();

    assert_eq!(remote.remote_id, "321");
    assert_eq!(remote.url.as_deref(), Some("https://wp.example.com/brewing-genmaicha/"));
}

#[tokio::test]
async fn wordpress_existing_term_reuses_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "term_exists",
            "message": "A term with the name provided already exists.",
            "data": { "status": 400, "term_id": 12 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts/321"))
        .and(body_partial_json(json!({ "status": "draft", "tags": [12, 12] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 321 })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = WordPressPublisher::new(&server.uri(), "editor", "pw", 5, UA).unwrap();
    let remote = publisher.update("321", &post(true)).await.unwrap();
    assert_eq!(remote.remote_id, "321");
}

#[tokio::test]
async fn wordpress_forbidden_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "rest_not_logged_in",
            "message": "You are not currently logged in."
        })))
        .mount(&server)
        .await;

    let publisher = WordPressPublisher::new(&server.uri(), "editor", "wrong", 5, UA).unwrap();
    let err = publisher.verify().await.unwrap_err();
    assert!(matches!(
        err,
        PublishError::Unauthorized {
            platform: Platform::WordPress,
            status: 401
        }
    ));
}

#[tokio::test]
async fn ghost_publishes_html_with_jwt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ghost/api/admin/posts/"))
        .and(query_param("source", "html"))
        .and(header_regex("authorization", r"^Ghost [\w-]+\.[\w-]+\.[\w-]+$"))
        .and(body_partial_json(json!({
            "posts": [{
                "slug": "brewing-genmaicha",
                "status": "published",
                "custom_excerpt": "How to brew it.",
                "tags": [{ "name": "Tea" }, { "name": "Green" }]
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "posts": [{ "id": "66aa", "url": "https://ghost.example.com/brewing-genmaicha/" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = GhostPublisher::new(&server.uri(), GHOST_KEY, 5, UA).unwrap();
    let remote = publisher.publish(&post(false)).await.unwrap();
    assert_eq!(remote.remote_id, "66aa");
}

#[tokio::test]
async fn ghost_update_sends_current_updated_at() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ghost/api/admin/posts/66aa/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{ "id": "66aa", "updated_at": "2026-01-02T03:04:05.000Z" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/ghost/api/admin/posts/66aa/"))
        .and(body_partial_json(json!({
            "posts": [{ "updated_at": "2026-01-02T03:04:05.000Z", "status": "draft" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{ "id": "66aa", "url": "https://ghost.example.com/p/66aa/" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = GhostPublisher::new(&server.uri(), GHOST_KEY, 5, UA).unwrap();
    let remote = publisher.update("66aa", &post(true)).await.unwrap();
    assert_eq!(remote.url.as_deref(), Some("https://ghost.example.com/p/66aa/"));
}

#[tokio::test]
async fn ghost_validation_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ghost/api/admin/posts/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{ "message": "Validation error, cannot save post.", "type": "ValidationError" }]
        })))
        .mount(&server)
        .await;

    let publisher = GhostPublisher::new(&server.uri(), GHOST_KEY, 5, UA).unwrap();
    match publisher.publish(&post(false)).await.unwrap_err() {
        PublishError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Validation error, cannot save post.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn medium_looks_up_user_then_posts_markdown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer med-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "u42", "username": "leafhouse", "name": "Leafhouse" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/users/u42/posts"))
        .and(body_partial_json(json!({
            "contentFormat": "markdown",
            "publishStatus": "draft",
            "content": "# Brewing Genmaicha\n\nUse **80C** water.",
            "canonicalUrl": "https://tea.example.com/blogs/news/brewing-genmaicha"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "m1", "url": "https://medium.com/@leafhouse/m1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = MediumPublisher::new("med-token", 5, UA)
        .unwrap()
        .with_base_url(&server.uri());
    let remote = publisher.publish(&post(true)).await.unwrap();
    assert_eq!(remote.remote_id, "m1");
    assert_eq!(publisher.verify().await.unwrap(), "@leafhouse");

    let err = publisher.update("m1", &post(true)).await.unwrap_err();
    assert!(matches!(err, PublishError::Unsupported { .. }));
}

#[tokio::test]
async fn webflow_creates_and_updates_items() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/collections/col1/items"))
        .and(body_partial_json(json!({
            "isDraft": false,
            "fieldData": {
                "name": "Brewing Genmaicha",
                "slug": "brewing-genmaicha",
                "post-summary": "How to brew it."
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "id": "item9" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v2/collections/col1/items/item9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item9" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/collections/col1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "col1", "displayName": "Blog Posts", "slug": "post"
        })))
        .mount(&server)
        .await;

    let publisher = WebflowPublisher::new("wf-token", "col1", 5, UA)
        .unwrap()
        .with_base_url(&server.uri());
    assert_eq!(publisher.publish(&post(false)).await.unwrap().remote_id, "item9");
    assert_eq!(publisher.update("item9", &post(false)).await.unwrap().remote_id, "item9");
    assert_eq!(publisher.verify().await.unwrap(), "Blog Posts");
}

#[tokio::test]
async fn shopify_falls_back_to_first_blog() {
    let server = MockServer::start().await;
    let graphql = "/admin/api/2024-10/graphql.json";

    Mock::given(method("POST"))
        .and(path(graphql))
        .and(body_partial_json(json!({ "variables": { "first": 50 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "blogs": { "nodes": [
                { "id": "gid://shopify/Blog/7", "title": "News", "handle": "news" }
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(graphql))
        .and(body_partial_json(json!({
            "variables": { "article": { "blogId": "gid://shopify/Blog/7", "isPublished": true } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "articleCreate": {
                "article": { "id": "gid://shopify/Article/1", "handle": "brewing-genmaicha", "blog": { "handle": "news" } },
                "userErrors": []
            }}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = AdminClient::new("tea.myshopify.com", "shpat", "2024-10", 5)
        .unwrap()
        .with_base_url(&server.uri());
    let publisher = ShopifyPublisher::new(client, None);

    for _ in 0..2 {
        let remote = publisher.publish(&post(false)).await.unwrap();
        assert_eq!(remote.remote_id, "gid://shopify/Article/1");
        assert_eq!(
            remote.url.as_deref(),
            Some("https://tea.myshopify.com/blogs/news/brewing-genmaicha")
        );
    }
}
