//! End-of-session summary persistence.
//!
//! A summary is written exactly once per session; the `session_id` column is
//! unique and a second insert is reported as `AlreadyExists`.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{ConversationSummary, NewConversationSummary};

/// Persist a session summary.
pub async fn insert_summary(
    pool: &SqlitePool,
    summary: &NewConversationSummary,
) -> Result<ConversationSummary> {
    let booked = serde_json::to_string(&summary.booked_appointments)?;
    let preferences = serde_json::to_string(&summary.preferences)?;
    let costs = serde_json::to_string(&summary.cost_breakdown)?;

    sqlx::query_as::<_, ConversationSummary>(
        r#"
        INSERT INTO conversation_summaries
            (contact_number, session_id, summary, booked_appointments, preferences, cost_breakdown)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, contact_number, session_id, summary, booked_appointments,
                  preferences, cost_breakdown, created_at
        "#,
    )
    .bind(&summary.contact_number)
    .bind(&summary.session_id)
    .bind(&summary.summary)
    .bind(booked)
    .bind(preferences)
    .bind(costs)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if DatabaseError::is_unique_violation(&e) {
            return DatabaseError::AlreadyExists {
                entity: "ConversationSummary",
                id: summary.session_id.clone(),
            };
        }
        DatabaseError::Sqlx(e)
    })
}

/// Get the summary written for a session.
pub async fn get_by_session(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Option<ConversationSummary>> {
    let record = sqlx::query_as::<_, ConversationSummary>(
        r#"
        SELECT id, contact_number, session_id, summary, booked_appointments,
               preferences, cost_breakdown, created_at
        FROM conversation_summaries
        WHERE session_id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List a caller's most recent summaries.
pub async fn list_for_contact(
    pool: &SqlitePool,
    contact_number: &str,
    limit: i64,
) -> Result<Vec<ConversationSummary>> {
    let rows = sqlx::query_as::<_, ConversationSummary>(
        r#"
        SELECT id, contact_number, session_id, summary, booked_appointments,
               preferences, cost_breakdown, created_at
        FROM conversation_summaries
        WHERE contact_number = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(contact_number)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count stored summaries.
pub async fn count_summaries(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM conversation_summaries
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
