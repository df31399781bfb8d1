//! Catalog command handlers: storefront sync and price reconciliation.
//!
//! Both read the public `products.json` feed of the configured store. Writes
//! happen under a `sync_runs` row so the API can report them.

use anyhow::Context;
use clap::Subcommand;
use pressroom_core::{AppConfig, PriceMismatch, ReconcileReport};
use pressroom_db::{RUN_TYPE_PRICES, RUN_TYPE_PRODUCTS};
use pressroom_shopify::{StorefrontCatalog, StorefrontClient};

use crate::fail_run_best_effort;

/// Sub-commands available under `products`.
#[derive(Debug, Subcommand)]
pub enum ProductCommands {
    /// Pull the storefront feed into the database
    Sync {
        /// Fetch and count the feed without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

/// Sub-commands available under `prices`.
#[derive(Debug, Subcommand)]
pub enum PriceCommands {
    /// Compare stored prices with the storefront feed
    Reconcile {
        /// Write feed prices into the database
        #[arg(long)]
        apply: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

async fn fetch_feed(config: &AppConfig) -> anyhow::Result<StorefrontCatalog> {
    let shopify = config.shopify().context(
        "Shopify is not configured; set SHOPIFY_STORE_DOMAIN and SHOPIFY_ADMIN_ACCESS_TOKEN",
    )?;
    let client = StorefrontClient::new(
        config.http_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .context("failed to build storefront client")?;

    let catalog = client
        .fetch_catalog(
            &shopify.storefront_url,
            &shopify.currency_code,
            config.inter_request_delay_ms,
        )
        .await?;
    Ok(catalog)
}

/// Pulls the storefront feed and upserts products and variants, archiving
/// products that left the feed.
///
/// With `dry_run` the feed is fetched and counted but nothing is written.
///
/// # Errors
///
/// Returns an error if Shopify is not configured, the feed cannot be
/// fetched, or the database write fails.
pub(crate) async fn run_products_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let catalog = fetch_feed(config).await?;
        let variants: usize = catalog.products.iter().map(|p| p.variants.len()).sum();
        println!(
            "dry-run: feed has {} products with {variants} variants ({} unusable); nothing written",
            catalog.products.len(),
            catalog.skipped.len()
        );
        return Ok(());
    }

    let run = pressroom_db::create_sync_run(pool, RUN_TYPE_PRODUCTS, "cli").await?;
    if let Err(e) = pressroom_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, RUN_TYPE_PRODUCTS, format!("{e:#}")).await;
        return Err(e.into());
    }

    let result = async {
        let catalog = fetch_feed(config).await?;
        Ok::<_, anyhow::Error>(
            pressroom_db::store_catalog(pool, &catalog.products, &catalog.skipped).await?,
        )
    }
    .await;

    match result {
        Ok(summary) => {
            pressroom_db::complete_sync_run(pool, run.id, summary.records_processed()).await?;
            println!(
                "synced {} products ({} variants), archived {}, skipped {}",
                summary.products, summary.variants, summary.archived, summary.skipped
            );
            Ok(())
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, RUN_TYPE_PRODUCTS, format!("{e:#}")).await;
            Err(e)
        }
    }
}

/// Diffs stored prices against the feed and prints the report. With
/// `apply`, writes the feed's prices under a `prices` sync run.
///
/// # Errors
///
/// Returns an error if the feed or stored prices cannot be loaded, or the
/// updates cannot be applied.
pub(crate) async fn run_prices_reconcile(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    apply: bool,
    json: bool,
) -> anyhow::Result<()> {
    let feed = fetch_feed(config).await?.products;
    let stored = pressroom_db::list_stored_variant_prices(pool).await?;
    let report = pressroom_core::reconcile_prices(&stored, &feed);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !apply {
        return Ok(());
    }

    let run = pressroom_db::create_sync_run(pool, RUN_TYPE_PRICES, "cli").await?;
    if let Err(e) = pressroom_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, RUN_TYPE_PRICES, format!("{e:#}")).await;
        return Err(e.into());
    }

    match pressroom_db::apply_price_updates(pool, Some(run.id), report.price_updates()).await {
        Ok(applied) => {
            let records = i32::try_from(applied).unwrap_or(i32::MAX);
            pressroom_db::complete_sync_run(pool, run.id, records).await?;
            if !json {
                println!("applied {applied} price update(s)");
            }
            Ok(())
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, RUN_TYPE_PRICES, format!("{e:#}")).await;
            Err(e.into())
        }
    }
}

fn print_report(report: &ReconcileReport) {
    println!(
        "checked {} stored variants: {} matched, {} mismatched",
        report.checked,
        report.matched,
        report.mismatches.len()
    );
    if report.is_clean() {
        return;
    }

    println!();
    println!("{:<22}{}", "KIND", "DETAIL");
    for mismatch in &report.mismatches {
        println!("{:<22}{mismatch}", mismatch_kind(mismatch));
    }
}

fn mismatch_kind(mismatch: &PriceMismatch) -> &'static str {
    match mismatch {
        PriceMismatch::PriceChanged { .. } => "price_changed",
        PriceMismatch::CompareAtChanged { .. } => "compare_at_changed",
        PriceMismatch::MissingFromFeed { .. } => "missing_from_feed",
        PriceMismatch::MissingFromDatabase { .. } => "missing_from_database",
    }
}
