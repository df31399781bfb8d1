//! Live integration tests for pressroom-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. `"../../migrations"` is relative to the crate root.

use chrono::{Duration, Utc};
use pressroom_core::{
    reconcile_prices, ArticleStatus, NormalizedProduct, NormalizedVariant, Platform,
    PublicationStatus,
};
use pressroom_db::{
    apply_price_updates, archive_products_missing_from, complete_sync_run, create_article,
    create_sync_run, delete_article, fail_sync_run, get_article_by_public_id, get_product,
    get_publication, get_sync_run, list_articles, list_due_scheduled_articles,
    list_price_adjustments, list_products, list_publications_for_article,
    list_stored_variant_prices, list_variants_for_product, set_article_status, start_sync_run,
    remote_ids_for_article, store_catalog, update_article, update_variant_price, upsert_product,
    upsert_publication, upsert_variant, ArticleChanges, ArticleFilters, DbError, NewArticle,
    ProductFilters, PublicationUpdate, RUN_TYPE_PRICES, RUN_TYPE_PRODUCTS,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_variant(source_variant_id: &str, cents: i64) -> NormalizedVariant {
    NormalizedVariant {
        source_variant_id: source_variant_id.to_string(),
        sku: None,
        title: "Default Title".to_string(),
        price: Decimal::new(cents, 2),
        compare_at_price: None,
        currency_code: "USD".to_string(),
        is_available: true,
        is_default: true,
        position: Some(1),
    }
}

fn make_product(source_product_id: &str, variants: Vec<NormalizedVariant>) -> NormalizedProduct {
    NormalizedProduct {
        source_product_id: source_product_id.to_string(),
        title: format!("Tea {source_product_id}"),
        handle: format!("tea-{source_product_id}"),
        vendor: Some("Leafhouse".to_string()),
        product_type: None,
        description_html: None,
        tags: vec!["tea".to_string()],
        source_url: None,
        image_url: None,
        variants,
    }
}

async fn store(pool: &sqlx::PgPool, product: &NormalizedProduct) -> i64 {
    let product_id = upsert_product(pool, product)
        .await
        .expect("upsert_product failed");
    for variant in &product.variants {
        upsert_variant(pool, product_id, variant)
            .await
            .expect("upsert_variant failed");
    }
    product_id
}

fn new_article(title: &str, status: ArticleStatus) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        slug: pressroom_core::slugify(title),
        excerpt: None,
        body_markdown: "Body".to_string(),
        featured_image_url: None,
        tags: vec!["tea".to_string()],
        seo_title: None,
        seo_description: None,
        author_name: None,
        status,
        scheduled_for: None,
        product_id: None,
        ai_provider: None,
        ai_model: None,
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_product_is_idempotent(pool: sqlx::PgPool) {
    let product = make_product("100", vec![make_variant("1001", 1299)]);
    let first = store(&pool, &product).await;
    let second = store(&pool, &product).await;
    assert_eq!(first, second);

    let variants = list_variants_for_product(&pool, first).await.unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].price, Decimal::new(1299, 2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_aggregates_prices(pool: sqlx::PgPool) {
    store(
        &pool,
        &make_product("100", vec![make_variant("1001", 500), make_variant("1002", 900)]),
    )
    .await;
    store(&pool, &make_product("200", vec![])).await;

    let rows = list_products(
        &pool,
        &ProductFilters {
            search: Some("tea 1".to_string()),
            limit: 10,
            ..ProductFilters::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].variant_count, 2);
    assert_eq!(rows[0].min_price, Some(Decimal::new(500, 2)));
    assert_eq!(rows[0].max_price, Some(Decimal::new(900, 2)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_catalog_upserts_and_archives(pool: sqlx::PgPool) {
    let stale = store(&pool, &make_product("900", vec![make_variant("9001", 500)])).await;

    let catalog = vec![
        make_product("100", vec![make_variant("1001", 1299), make_variant("1002", 1599)]),
        make_product("200", vec![make_variant("2001", 2499)]),
    ];
    let summary = store_catalog(&pool, &catalog, &[]).await.unwrap();

    assert_eq!(summary.products, 2);
    assert_eq!(summary.variants, 3);
    assert_eq!(summary.archived, 1);
    assert_eq!(get_product(&pool, stale).await.unwrap().status, "archived");
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_catalog_with_empty_feed_archives_nothing(pool: sqlx::PgPool) {
    let kept = store(&pool, &make_product("100", vec![make_variant("1001", 1299)])).await;

    let summary = store_catalog(&pool, &[], &[]).await.unwrap();

    assert_eq!(summary.archived, 0);
    assert_eq!(get_product(&pool, kept).await.unwrap().status, "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_catalog_keeps_products_that_failed_normalization(pool: sqlx::PgPool) {
    let unparsed = store(&pool, &make_product("300", vec![make_variant("3001", 800)])).await;
    let removed = store(&pool, &make_product("400", vec![make_variant("4001", 800)])).await;

    let catalog = vec![make_product("100", vec![make_variant("1001", 1299)])];
    let summary = store_catalog(&pool, &catalog, &["300".to_string()])
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.archived, 1);
    assert_eq!(get_product(&pool, unparsed).await.unwrap().status, "active");
    assert_eq!(get_product(&pool, removed).await.unwrap().status, "archived");
}

#[sqlx::test(migrations = "../../migrations")]
async fn archive_marks_products_missing_from_feed(pool: sqlx::PgPool) {
    let kept = store(&pool, &make_product("100", vec![])).await;
    let dropped = store(&pool, &make_product("200", vec![])).await;

    let archived = archive_products_missing_from(&pool, &["100".to_string()])
        .await
        .unwrap();
    assert_eq!(archived, 1);
    assert_eq!(get_product(&pool, kept).await.unwrap().status, "active");
    assert_eq!(get_product(&pool, dropped).await.unwrap().status, "archived");
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_product_missing_is_not_found(pool: sqlx::PgPool) {
    assert!(matches!(get_product(&pool, 999).await, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_and_apply_updates_prices(pool: sqlx::PgPool) {
    store(&pool, &make_product("100", vec![make_variant("1001", 1000)])).await;

    let stored = list_stored_variant_prices(&pool).await.unwrap();
    let feed = vec![make_product("100", vec![make_variant("1001", 1200)])];
    let report = reconcile_prices(&stored, &feed);
    assert_eq!(report.price_updates().len(), 1);

    let run = create_sync_run(&pool, RUN_TYPE_PRICES, "cli").await.unwrap();
    start_sync_run(&pool, run.id).await.unwrap();
    let applied = apply_price_updates(&pool, Some(run.id), report.price_updates())
        .await
        .unwrap();
    assert_eq!(applied, 1);
    complete_sync_run(&pool, run.id, 1).await.unwrap();

    let stored = list_stored_variant_prices(&pool).await.unwrap();
    assert_eq!(stored[0].price, Decimal::new(1200, 2));

    let adjustments = list_price_adjustments(&pool, run.id).await.unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].old_price, Decimal::new(1000, 2));
    assert_eq!(adjustments[0].new_price, Decimal::new(1200, 2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_variant_price_unknown_variant(pool: sqlx::PgPool) {
    let result = update_variant_price(&pool, 4242, Decimal::ONE, None).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

// ---------------------------------------------------------------------------
// Sync runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sync_run_lifecycle_queued_to_failed(pool: sqlx::PgPool) {
    let run = create_sync_run(&pool, RUN_TYPE_PRODUCTS, "scheduler").await.unwrap();
    assert_eq!(run.status, "queued");

    start_sync_run(&pool, run.id).await.unwrap();
    fail_sync_run(&pool, run.id, "feed returned 503").await.unwrap();

    let run = get_sync_run(&pool, run.id).await.unwrap();
    assert_eq!(run.status, "failed");
    assert_eq!(run.error_message.as_deref(), Some("feed returned 503"));
    assert!(run.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_run_cannot_complete_before_start(pool: sqlx::PgPool) {
    let run = create_sync_run(&pool, RUN_TYPE_PRODUCTS, "cli").await.unwrap();
    let result = complete_sync_run(&pool, run.id, 3).await;
    assert!(matches!(
        result,
        Err(DbError::InvalidSyncRunTransition {
            expected_status: "running",
            ..
        })
    ));
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_slug_is_conflict(pool: sqlx::PgPool) {
    create_article(&pool, &new_article("Green Tea Guide", ArticleStatus::Draft))
        .await
        .unwrap();
    let result = create_article(&pool, &new_article("Green Tea Guide", ArticleStatus::Draft)).await;
    assert!(matches!(result, Err(DbError::Conflict(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn sparse_update_keeps_untouched_fields(pool: sqlx::PgPool) {
    let article = create_article(&pool, &new_article("Matcha Basics", ArticleStatus::Draft))
        .await
        .unwrap();

    let updated = update_article(
        &pool,
        article.public_id,
        &ArticleChanges {
            excerpt: Some("Whisk, don't stir.".to_string()),
            ..ArticleChanges::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.title, "Matcha Basics");
    assert_eq!(updated.body_markdown, "Body");
    assert_eq!(updated.excerpt.as_deref(), Some("Whisk, don't stir."));
}

#[sqlx::test(migrations = "../../migrations")]
async fn status_transitions_are_enforced(pool: sqlx::PgPool) {
    let article = create_article(&pool, &new_article("Pu-erh Aging", ArticleStatus::Draft))
        .await
        .unwrap();

    let published = set_article_status(&pool, article.public_id, ArticleStatus::Published, None)
        .await
        .unwrap();
    assert_eq!(published.status, "published");
    assert!(published.published_at.is_some());

    let back_to_draft =
        set_article_status(&pool, article.public_id, ArticleStatus::Draft, None).await;
    assert!(matches!(
        back_to_draft,
        Err(DbError::InvalidArticleTransition {
            from: ArticleStatus::Published,
            to: ArticleStatus::Draft
        })
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn scheduling_requires_a_time(pool: sqlx::PgPool) {
    let article = create_article(&pool, &new_article("White Tea", ArticleStatus::Draft))
        .await
        .unwrap();
    let result = set_article_status(&pool, article.public_id, ArticleStatus::Scheduled, None).await;
    assert!(matches!(result, Err(DbError::InvalidInput(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn due_scheduled_articles_only_in_the_past(pool: sqlx::PgPool) {
    let now = Utc::now();
    let due = create_article(&pool, &new_article("Due Post", ArticleStatus::Draft))
        .await
        .unwrap();
    let later = create_article(&pool, &new_article("Later Post", ArticleStatus::Draft))
        .await
        .unwrap();

    set_article_status(
        &pool,
        due.public_id,
        ArticleStatus::Scheduled,
        Some(now - Duration::minutes(5)),
    )
    .await
    .unwrap();
    set_article_status(
        &pool,
        later.public_id,
        ArticleStatus::Scheduled,
        Some(now + Duration::hours(2)),
    )
    .await
    .unwrap();

    let rows = list_due_scheduled_articles(&pool, now, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].public_id, due.public_id);

    let scheduled = list_articles(
        &pool,
        &ArticleFilters {
            status: Some(ArticleStatus::Scheduled),
            search: None,
            limit: 10,
        },
    )
    .await
    .unwrap();
    assert_eq!(scheduled.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_article_cascades_publications(pool: sqlx::PgPool) {
    let article = create_article(&pool, &new_article("Rooibos", ArticleStatus::Draft))
        .await
        .unwrap();
    upsert_publication(
        &pool,
        &PublicationUpdate {
            article_id: article.id,
            platform: Platform::Ghost,
            status: PublicationStatus::Published,
            remote_id: Some("ghost-1"),
            remote_url: None,
            error_message: None,
        },
    )
    .await
    .unwrap();

    delete_article(&pool, article.public_id).await.unwrap();
    assert!(matches!(
        get_article_by_public_id(&pool, article.public_id).await,
        Err(DbError::NotFound)
    ));
    assert!(list_publications_for_article(&pool, article.id)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Publications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn failed_republish_keeps_remote_id(pool: sqlx::PgPool) {
    let article = create_article(&pool, &new_article("Sencha", ArticleStatus::Draft))
        .await
        .unwrap();

    let first = upsert_publication(
        &pool,
        &PublicationUpdate {
            article_id: article.id,
            platform: Platform::WordPress,
            status: PublicationStatus::Published,
            remote_id: Some("77"),
            remote_url: Some("https://blog.example.com/sencha"),
            error_message: None,
        },
    )
    .await
    .unwrap();
    assert!(first.published_at.is_some());

    let second = upsert_publication(
        &pool,
        &PublicationUpdate {
            article_id: article.id,
            platform: Platform::WordPress,
            status: PublicationStatus::Failed,
            remote_id: None,
            remote_url: None,
            error_message: Some("401 Unauthorized"),
        },
    )
    .await
    .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, "failed");
    assert_eq!(second.remote_id.as_deref(), Some("77"));
    assert_eq!(second.error_message.as_deref(), Some("401 Unauthorized"));
    assert_eq!(second.published_at, first.published_at);

    let fetched = get_publication(&pool, article.id, Platform::WordPress)
        .await
        .unwrap()
        .expect("publication exists");
    assert_eq!(fetched.id, first.id);
    assert!(get_publication(&pool, article.id, Platform::Medium)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn remote_ids_cover_only_platforms_with_a_copy(pool: sqlx::PgPool) {
    let article = create_article(&pool, &new_article("Hojicha", ArticleStatus::Draft))
        .await
        .unwrap();
    for (platform, status, remote_id) in [
        (Platform::Ghost, PublicationStatus::Published, Some("gh-1")),
        (Platform::Medium, PublicationStatus::Failed, None),
    ] {
        upsert_publication(
            &pool,
            &PublicationUpdate {
                article_id: article.id,
                platform,
                status,
                remote_id,
                remote_url: None,
                error_message: None,
            },
        )
        .await
        .unwrap();
    }

    let ids = remote_ids_for_article(&pool, article.id).await.unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids.get(&Platform::Ghost).map(String::as_str), Some("gh-1"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn every_run_type_constant_satisfies_the_schema(pool: sqlx::PgPool) {
    for run_type in [RUN_TYPE_PRODUCTS, RUN_TYPE_PRICES] {
        for trigger in ["cli", "api", "scheduler"] {
            let run = create_sync_run(&pool, run_type, trigger).await.unwrap();
            assert_eq!(run.run_type, run_type);
            assert_eq!(run.status, "queued");
        }
    }
}
