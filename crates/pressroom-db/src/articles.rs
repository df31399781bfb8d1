//! Database operations for `articles`.

use chrono::{DateTime, Utc};
use pressroom_core::{AiProvider, ArticleStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body_markdown: String,
    pub featured_image_url: Option<String>,
    pub tags: Vec<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub author_name: Option<String>,
    /// One of `draft`, `scheduled`, `published`, `archived` (CHECK constraint).
    pub status: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub product_id: Option<i64>,
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleRow {
    /// Parses the `status` column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidData`] if the column holds an unknown value.
    pub fn article_status(&self) -> Result<ArticleStatus, DbError> {
        Ok(self.status.parse::<ArticleStatus>()?)
    }
}

/// Values for a new article. The slug must already be unique-ready
/// (see [`pressroom_core::slugify`]).
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body_markdown: String,
    pub featured_image_url: Option<String>,
    pub tags: Vec<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub author_name: Option<String>,
    pub status: ArticleStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub product_id: Option<i64>,
    pub ai_provider: Option<AiProvider>,
    pub ai_model: Option<String>,
}

/// A sparse update: `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body_markdown: Option<String>,
    pub featured_image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub author_name: Option<String>,
    pub product_id: Option<i64>,
}

impl ArticleChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.excerpt.is_none()
            && self.body_markdown.is_none()
            && self.featured_image_url.is_none()
            && self.tags.is_none()
            && self.seo_title.is_none()
            && self.seo_description.is_none()
            && self.author_name.is_none()
            && self.product_id.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleFilters {
    pub status: Option<ArticleStatus>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub limit: i64,
}

const ARTICLE_COLUMNS: &str = "id, public_id, title, slug, excerpt, body_markdown, \
     featured_image_url, tags, seo_title, seo_description, author_name, status, \
     scheduled_for, published_at, product_id, ai_provider, ai_model, created_at, updated_at";

/// Inserts a new article with a freshly generated `public_id`.
///
/// `published_at` is set to `NOW()` when the article is created already
/// published.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the slug is already taken, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_article(pool: &PgPool, article: &NewArticle) -> Result<ArticleRow, DbError> {
    let public_id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO articles \
             (public_id, title, slug, excerpt, body_markdown, featured_image_url, tags, \
              seo_title, seo_description, author_name, status, scheduled_for, published_at, \
              product_id, ai_provider, ai_model) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
                 CASE WHEN $11 = 'published' THEN NOW() END, $13, $14, $15) \
         RETURNING {ARTICLE_COLUMNS}"
    );

    sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(public_id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.excerpt)
        .bind(&article.body_markdown)
        .bind(&article.featured_image_url)
        .bind(&article.tags)
        .bind(&article.seo_title)
        .bind(&article.seo_description)
        .bind(&article.author_name)
        .bind(article.status.as_str())
        .bind(article.scheduled_for)
        .bind(article.product_id)
        .bind(article.ai_provider.map(AiProvider::as_str))
        .bind(&article.ai_model)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DbError::from_unique_violation(e, format!("slug '{}' is already in use", article.slug))
        })
}

/// Fetches an article by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no article has that id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_article_by_public_id(pool: &PgPool, public_id: Uuid) -> Result<ArticleRow, DbError> {
    let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE public_id = $1");
    sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Lists articles, most recently updated first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(pool: &PgPool, filters: &ArticleFilters) -> Result<Vec<ArticleRow>, DbError> {
    let search = filters.search.as_ref().map(|s| format!("%{}%", s.trim()));
    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::text IS NULL OR title ILIKE $2) \
         ORDER BY updated_at DESC, id DESC \
         LIMIT $3"
    );

    let rows = sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(filters.status.map(ArticleStatus::as_str))
        .bind(search)
        .bind(filters.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Applies a sparse update and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the article does not exist,
/// [`DbError::Conflict`] if a new slug is already taken, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_article(
    pool: &PgPool,
    public_id: Uuid,
    changes: &ArticleChanges,
) -> Result<ArticleRow, DbError> {
    if changes.is_empty() {
        return get_article_by_public_id(pool, public_id).await;
    }

    let sql = format!(
        "UPDATE articles SET \
             title              = COALESCE($2, title), \
             slug               = COALESCE($3, slug), \
             excerpt            = COALESCE($4, excerpt), \
             body_markdown      = COALESCE($5, body_markdown), \
             featured_image_url = COALESCE($6, featured_image_url), \
             tags               = COALESCE($7, tags), \
             seo_title          = COALESCE($8, seo_title), \
             seo_description    = COALESCE($9, seo_description), \
             author_name        = COALESCE($10, author_name), \
             product_id         = COALESCE($11, product_id), \
             updated_at         = NOW() \
         WHERE public_id = $1 \
         RETURNING {ARTICLE_COLUMNS}"
    );

    let slug_for_error = changes.slug.clone().unwrap_or_default();
    sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(public_id)
        .bind(&changes.title)
        .bind(&changes.slug)
        .bind(&changes.excerpt)
        .bind(&changes.body_markdown)
        .bind(&changes.featured_image_url)
        .bind(&changes.tags)
        .bind(&changes.seo_title)
        .bind(&changes.seo_description)
        .bind(&changes.author_name)
        .bind(changes.product_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            DbError::from_unique_violation(e, format!("slug '{slug_for_error}' is already in use"))
        })?
        .ok_or(DbError::NotFound)
}

/// Moves an article to `next`, enforcing the editorial lifecycle.
///
/// Scheduling requires `scheduled_for`; publishing stamps `published_at`
/// the first time. The update is guarded on the status read beforehand, so
/// a concurrent change yields [`DbError::Conflict`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`], [`DbError::InvalidArticleTransition`],
/// [`DbError::InvalidInput`], [`DbError::Conflict`], or [`DbError::Sqlx`].
pub async fn set_article_status(
    pool: &PgPool,
    public_id: Uuid,
    next: ArticleStatus,
    scheduled_for: Option<DateTime<Utc>>,
) -> Result<ArticleRow, DbError> {
    let current = get_article_by_public_id(pool, public_id).await?;
    let from = current.article_status()?;

    if !from.can_transition_to(next) {
        return Err(DbError::InvalidArticleTransition { from, to: next });
    }
    if next == ArticleStatus::Scheduled && scheduled_for.is_none() {
        return Err(DbError::InvalidInput(
            "scheduling an article requires scheduled_for".to_string(),
        ));
    }

    let sql = format!(
        "UPDATE articles SET \
             status        = $2, \
             scheduled_for = CASE WHEN $2 = 'scheduled' THEN $3 ELSE NULL END, \
             published_at  = CASE WHEN $2 = 'published' THEN COALESCE(published_at, NOW()) \
                                  ELSE published_at END, \
             updated_at    = NOW() \
         WHERE public_id = $1 AND status = $4 \
         RETURNING {ARTICLE_COLUMNS}"
    );

    sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(public_id)
        .bind(next.as_str())
        .bind(scheduled_for)
        .bind(from.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::Conflict(format!("article {public_id} changed status concurrently")))
}

/// Deletes an article and, by cascade, its publication records.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if nothing was deleted, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_article(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM articles WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Returns `scheduled` articles whose `scheduled_for` is at or before `now`,
/// oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_due_scheduled_articles(
    pool: &PgPool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles \
         WHERE status = 'scheduled' AND scheduled_for <= $1 \
         ORDER BY scheduled_for ASC, id ASC \
         LIMIT $2"
    );

    let rows = sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
