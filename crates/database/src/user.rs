//! User persistence.
//!
//! Users are never created explicitly: identification upserts them, merging
//! new values over stored ones.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::User;

/// Create or refresh a user.
///
/// A present `name`/`email` overwrites the stored value, an absent one
/// preserves it. `updated_at` is refreshed on every call.
pub async fn upsert_user(
    pool: &SqlitePool,
    contact_number: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (contact_number, name, email)
        VALUES (?, ?, ?)
        ON CONFLICT(contact_number) DO UPDATE SET
            name = COALESCE(excluded.name, users.name),
            email = COALESCE(excluded.email, users.email),
            updated_at = datetime('now')
        RETURNING contact_number, name, email, created_at, updated_at
        "#,
    )
    .bind(contact_number)
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get a user by contact number.
pub async fn get_user(pool: &SqlitePool, contact_number: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT contact_number, name, email, created_at, updated_at
        FROM users
        WHERE contact_number = ?
        "#,
    )
    .bind(contact_number)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
