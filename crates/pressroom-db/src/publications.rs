//! Database operations for `article_publications`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pressroom_core::{Platform, PublicationStatus};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `article_publications` table: the state of one article on
/// one platform.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublicationRow {
    pub id: i64,
    pub article_id: i64,
    pub platform: String,
    pub status: String,
    /// Identifier assigned by the remote platform, used for later updates.
    pub remote_id: Option<String>,
    pub remote_url: Option<String>,
    pub error_message: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The outcome of a publish attempt to record.
#[derive(Debug, Clone)]
pub struct PublicationUpdate<'a> {
    pub article_id: i64,
    pub platform: Platform,
    pub status: PublicationStatus,
    pub remote_id: Option<&'a str>,
    pub remote_url: Option<&'a str>,
    pub error_message: Option<&'a str>,
}

const PUBLICATION_COLUMNS: &str = "id, article_id, platform, status, remote_id, remote_url, \
     error_message, published_at, created_at, updated_at";

/// Inserts or updates the publication record for `(article_id, platform)`.
///
/// A failed attempt keeps the `remote_id`/`remote_url` of an earlier success
/// so the post can still be updated in place. `published_at` is stamped on
/// the first successful publish.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_publication(
    pool: &PgPool,
    update: &PublicationUpdate<'_>,
) -> Result<PublicationRow, DbError> {
    let sql = format!(
        "INSERT INTO article_publications \
             (article_id, platform, status, remote_id, remote_url, error_message, published_at) \
         VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $3 = 'published' THEN NOW() END) \
         ON CONFLICT (article_id, platform) DO UPDATE SET \
             status        = EXCLUDED.status, \
             remote_id     = COALESCE(EXCLUDED.remote_id, article_publications.remote_id), \
             remote_url    = COALESCE(EXCLUDED.remote_url, article_publications.remote_url), \
             error_message = EXCLUDED.error_message, \
             published_at  = COALESCE(article_publications.published_at, EXCLUDED.published_at), \
             updated_at    = NOW() \
         RETURNING {PUBLICATION_COLUMNS}"
    );

    let row = sqlx::query_as::<_, PublicationRow>(&sql)
        .bind(update.article_id)
        .bind(update.platform.as_str())
        .bind(update.status.as_str())
        .bind(update.remote_id)
        .bind(update.remote_url)
        .bind(update.error_message)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Returns every publication record for an article, ordered by platform.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_publications_for_article(
    pool: &PgPool,
    article_id: i64,
) -> Result<Vec<PublicationRow>, DbError> {
    let sql = format!(
        "SELECT {PUBLICATION_COLUMNS} FROM article_publications \
         WHERE article_id = $1 \
         ORDER BY platform ASC"
    );
    let rows = sqlx::query_as::<_, PublicationRow>(&sql)
        .bind(article_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Remote ids of every platform that already holds a copy of the article.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidData`]
/// for an unknown stored platform.
pub async fn remote_ids_for_article(
    pool: &PgPool,
    article_id: i64,
) -> Result<BTreeMap<Platform, String>, DbError> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT platform, remote_id FROM article_publications \
         WHERE article_id = $1 AND remote_id IS NOT NULL",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    let mut ids = BTreeMap::new();
    for (platform, remote_id) in rows {
        ids.insert(platform.parse::<Platform>()?, remote_id);
    }
    Ok(ids)
}

/// Returns the publication record for one platform, if the article was ever
/// sent there.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_publication(
    pool: &PgPool,
    article_id: i64,
    platform: Platform,
) -> Result<Option<PublicationRow>, DbError> {
    let sql = format!(
        "SELECT {PUBLICATION_COLUMNS} FROM article_publications \
         WHERE article_id = $1 AND platform = $2"
    );
    let row = sqlx::query_as::<_, PublicationRow>(&sql)
        .bind(article_id)
        .bind(platform.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(row)
}
