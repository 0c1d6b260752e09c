//! Repository for the `styles` and `style_prompts` tables.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::style::Style;

/// Column list for `styles` queries.
const COLUMNS: &str = "id, name, prompt_prefix, prompt_suffix, created_at";

/// Provides lookups for styles and their ordered prompt templates.
pub struct StyleRepo;

impl StyleRepo {
    /// Create a style (catalog administration; used by tests and fixtures).
    pub async fn create(
        pool: &PgPool,
        name: &str,
        prompt_prefix: &str,
        prompt_suffix: &str,
    ) -> Result<Style, sqlx::Error> {
        let query = format!(
            "INSERT INTO styles (name, prompt_prefix, prompt_suffix) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Style>(&query)
            .bind(name)
            .bind(prompt_prefix)
            .bind(prompt_suffix)
            .fetch_one(pool)
            .await
    }

    /// Append a prompt template at the given position.
    pub async fn add_prompt(
        pool: &PgPool,
        style_id: DbId,
        position: i32,
        template: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO style_prompts (style_id, position, template) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(style_id)
        .bind(position)
        .bind(template)
        .fetch_one(pool)
        .await
    }

    /// Find a style by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Style>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM styles WHERE id = $1");
        sqlx::query_as::<_, Style>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The style's prompt templates in stored order.
    pub async fn list_prompts(pool: &PgPool, style_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT template FROM style_prompts \
             WHERE style_id = $1 \
             ORDER BY position ASC",
        )
        .bind(style_id)
        .fetch_all(pool)
        .await
    }
}
