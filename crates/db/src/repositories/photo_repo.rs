//! Repository for the `photos` table.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::photo::Photo;

/// Column list for `photos` queries.
const COLUMNS: &str = "id, avatar_id, style_id, prompt, url, created_at";

/// Provides idempotent persistence for generated photos.
pub struct PhotoRepo;

impl PhotoRepo {
    /// Whether a photo already exists for this (avatar, style, prompt)
    /// tuple. Checked before every insert so that re-ingesting the same
    /// task result never duplicates a photo.
    pub async fn exists(
        pool: &PgPool,
        avatar_id: DbId,
        style_id: DbId,
        prompt: &str,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM photos \
             WHERE avatar_id = $1 AND style_id = $2 AND prompt = $3 \
             LIMIT 1",
        )
        .bind(avatar_id)
        .bind(style_id)
        .bind(prompt)
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }

    /// Insert a photo, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        avatar_id: DbId,
        style_id: DbId,
        prompt: &str,
        url: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO photos (avatar_id, style_id, prompt, url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(avatar_id)
        .bind(style_id)
        .bind(prompt)
        .bind(url)
        .fetch_one(pool)
        .await
    }

    /// List all photos for an avatar/style pair in creation order.
    /// Creation order follows task ingestion; delivery re-derives the
    /// user-facing order from it.
    pub async fn list_for_avatar_style(
        pool: &PgPool,
        avatar_id: DbId,
        style_id: DbId,
    ) -> Result<Vec<Photo>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM photos \
             WHERE avatar_id = $1 AND style_id = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(avatar_id)
            .bind(style_id)
            .fetch_all(pool)
            .await
    }
}
