//! Repository for the `users` table.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, chat_id, created_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Create a user with their messaging chat id.
    pub async fn create(pool: &PgPool, chat_id: i64) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (chat_id) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(chat_id)
            .fetch_one(pool)
            .await
    }

    /// Find a user by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
