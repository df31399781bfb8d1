mod articles;
mod catalog;
mod platforms;

use clap::{Parser, Subcommand};
use pressroom_core::AppConfig;
use tracing_subscriber::EnvFilter;

use crate::articles::ArticleCommands;
use crate::catalog::{PriceCommands, ProductCommands};
use crate::platforms::PlatformCommands;

#[derive(Debug, Parser)]
#[command(name = "pressroom-cli")]
#[command(about = "Pressroom command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Storefront catalog sync
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Price reconciliation against the storefront feed
    Prices {
        #[command(subcommand)]
        command: PriceCommands,
    },
    /// Publish stored articles
    Articles {
        #[command(subcommand)]
        command: ArticleCommands,
    },
    /// Inspect publishing platforms
    Platforms {
        #[command(subcommand)]
        command: PlatformCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("pressroom-cli: run with --help to list commands");
        return Ok(());
    };

    let config = pressroom_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    pressroom_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = pressroom_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Commands::Products { command } => match command {
            ProductCommands::Sync { dry_run } => {
                let pool = connect(&config).await?;
                catalog::run_products_sync(&pool, &config, dry_run).await?;
            }
        },
        Commands::Prices { command } => match command {
            PriceCommands::Reconcile { apply, json } => {
                let pool = connect(&config).await?;
                catalog::run_prices_reconcile(&pool, &config, apply, json).await?;
            }
        },
        Commands::Articles { command } => match command {
            ArticleCommands::Publish {
                public_id,
                platforms,
                draft,
            } => {
                let pool = connect(&config).await?;
                articles::run_articles_publish(&pool, &config, public_id, &platforms, draft)
                    .await?;
            }
        },
        Commands::Platforms { command } => match command {
            PlatformCommands::List => platforms::run_platforms_list(&config),
            PlatformCommands::Verify { platform } => {
                platforms::run_platforms_verify(&config, platform).await?;
            }
        },
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = pressroom_db::PoolConfig::from_app_config(config);
    Ok(pressroom_db::connect_pool(&config.database_url, pool_config).await?)
}

/// Marks a sync run failed, logging instead of propagating if that fails too.
pub(crate) async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    run_type: &str,
    message: String,
) {
    if let Err(e) = pressroom_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(run_id, run_type, error = %e, "failed to mark sync run as failed");
    }
}
