//! Repository for the `avatars` table.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::avatar::Avatar;
use crate::models::status::AvatarStatus;

/// Column list for `avatars` queries.
const COLUMNS: &str = "id, user_id, status_id, reference_images, created_at, updated_at";

/// Provides CRUD operations for avatars (profiles).
pub struct AvatarRepo;

impl AvatarRepo {
    /// Create an avatar for a user with its reference image URLs.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        reference_images: &serde_json::Value,
        status: AvatarStatus,
    ) -> Result<Avatar, sqlx::Error> {
        let query = format!(
            "INSERT INTO avatars (user_id, reference_images, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Avatar>(&query)
            .bind(user_id)
            .bind(reference_images)
            .bind(status.id())
            .fetch_one(pool)
            .await
    }

    /// Find an avatar by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Avatar>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM avatars WHERE id = $1");
        sqlx::query_as::<_, Avatar>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set an avatar's status unconditionally.
    pub async fn set_status(
        pool: &PgPool,
        avatar_id: DbId,
        status: AvatarStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE avatars SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(avatar_id)
            .bind(status.id())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Conditionally move an avatar from one status to another.
    ///
    /// Compensation uses this to revert `generating` back to `ready`
    /// without clobbering an avatar some other flow already advanced.
    pub async fn transition_status(
        pool: &PgPool,
        avatar_id: DbId,
        from: AvatarStatus,
        to: AvatarStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE avatars \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(avatar_id)
        .bind(to.id())
        .bind(from.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
