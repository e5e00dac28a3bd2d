//! Appointment persistence and slot exclusivity.
//!
//! A slot is a `(appointment_date, appointment_time)` pair. At most one
//! `confirmed` appointment may hold a slot at any moment. Booking and
//! rescheduling check for a holder first, but the partial unique index
//! `idx_appointments_confirmed_slot` is what actually enforces the rule:
//! a write that loses a race is rejected by SQLite and surfaced as
//! [`DatabaseError::SlotTaken`].

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{Appointment, AppointmentStatus, NewAppointment};

/// Begin a transaction holding the write lock from its first statement, so
/// concurrent writers queue on `busy_timeout` instead of failing the
/// read-to-write lock upgrade with `SQLITE_BUSY`.
async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Find the confirmed appointment holding a slot, ignoring `exclude_id`.
async fn slot_holder(
    conn: &mut SqliteConnection,
    date: &str,
    time: &str,
    exclude_id: Option<i64>,
) -> Result<Option<i64>> {
    let holder = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM appointments
        WHERE appointment_date = ?
          AND appointment_time = ?
          AND status = 'confirmed'
          AND (? IS NULL OR id != ?)
        LIMIT 1
        "#,
    )
    .bind(date)
    .bind(time)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(holder)
}

/// Map a write error, turning uniqueness violations into `SlotTaken`.
fn slot_error(err: sqlx::Error, date: &str, time: &str) -> DatabaseError {
    if DatabaseError::is_unique_violation(&err) {
        return DatabaseError::SlotTaken {
            date: date.to_string(),
            time: time.to_string(),
        };
    }
    DatabaseError::Sqlx(err)
}

/// Book a slot for a caller.
///
/// The caller's user row is created if it does not exist yet. Fails with
/// [`DatabaseError::SlotTaken`] without writing anything if another
/// confirmed appointment holds the slot.
pub async fn insert_confirmed(pool: &SqlitePool, new: &NewAppointment) -> Result<Appointment> {
    let mut tx = begin_write(pool).await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (contact_number)
        VALUES (?)
        "#,
    )
    .bind(&new.contact_number)
    .execute(&mut *tx)
    .await?;

    if let Some(holder) =
        slot_holder(&mut tx, &new.appointment_date, &new.appointment_time, None).await?
    {
        debug!(
            "Slot {} {} already held by appointment {}",
            new.appointment_date, new.appointment_time, holder
        );
        return Err(DatabaseError::SlotTaken {
            date: new.appointment_date.clone(),
            time: new.appointment_time.clone(),
        });
    }

    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO appointments
            (contact_number, appointment_date, appointment_time, service_type, notes, status)
        VALUES (?, ?, ?, ?, ?, 'confirmed')
        RETURNING id, contact_number, appointment_date, appointment_time,
                  service_type, notes, status, created_at, updated_at
        "#,
    )
    .bind(&new.contact_number)
    .bind(&new.appointment_date)
    .bind(&new.appointment_time)
    .bind(&new.service_type)
    .bind(&new.notes)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| slot_error(e, &new.appointment_date, &new.appointment_time))?;

    tx.commit()
        .await
        .map_err(|e| slot_error(e, &new.appointment_date, &new.appointment_time))?;

    Ok(appointment)
}

/// Get an appointment by ID.
pub async fn get_appointment(pool: &SqlitePool, id: i64) -> Result<Appointment> {
    sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, contact_number, appointment_date, appointment_time,
               service_type, notes, status, created_at, updated_at
        FROM appointments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Appointment",
        id: id.to_string(),
    })
}

/// List a caller's appointments, most recent slot first.
pub async fn list_for_contact(
    pool: &SqlitePool,
    contact_number: &str,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>> {
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, contact_number, appointment_date, appointment_time,
               service_type, notes, status, created_at, updated_at
        FROM appointments
        WHERE contact_number = ?
          AND (? IS NULL OR status = ?)
        ORDER BY appointment_date DESC, appointment_time DESC, id DESC
        "#,
    )
    .bind(contact_number)
    .bind(status)
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Move a confirmed appointment owned by `contact_number` to `status`.
///
/// Returns `None` when no row matched: unknown id, another caller's
/// appointment, or an appointment that is no longer confirmed.
pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    contact_number: &str,
    status: AppointmentStatus,
) -> Result<Option<Appointment>> {
    let row = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments
        SET status = ?, updated_at = datetime('now')
        WHERE id = ?
          AND contact_number = ?
          AND status = 'confirmed'
        RETURNING id, contact_number, appointment_date, appointment_time,
                  service_type, notes, status, created_at, updated_at
        "#,
    )
    .bind(status.as_str())
    .bind(id)
    .bind(contact_number)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Cancel a confirmed appointment owned by `contact_number`.
pub async fn cancel(pool: &SqlitePool, id: i64, contact_number: &str) -> Result<Option<Appointment>> {
    set_status(pool, id, contact_number, AppointmentStatus::Cancelled).await
}

/// Reschedule a confirmed appointment owned by `contact_number`.
///
/// Absent fields keep their stored value. When both a date and a time are
/// given, other confirmed appointments at the target slot are checked first.
/// Returns `None` when no row matched.
pub async fn update_date_time(
    pool: &SqlitePool,
    id: i64,
    contact_number: &str,
    date: Option<&str>,
    time: Option<&str>,
) -> Result<Option<Appointment>> {
    let mut tx = begin_write(pool).await?;

    if let (Some(date), Some(time)) = (date, time) {
        if let Some(holder) = slot_holder(&mut tx, date, time, Some(id)).await? {
            debug!(
                "Cannot move appointment {} to {} {}: held by {}",
                id, date, time, holder
            );
            return Err(DatabaseError::SlotTaken {
                date: date.to_string(),
                time: time.to_string(),
            });
        }
    }

    let conflict_date = date.unwrap_or("(current date)");
    let conflict_time = time.unwrap_or("(current time)");

    let row = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments
        SET appointment_date = COALESCE(?, appointment_date),
            appointment_time = COALESCE(?, appointment_time),
            updated_at = datetime('now')
        WHERE id = ?
          AND contact_number = ?
          AND status = 'confirmed'
        RETURNING id, contact_number, appointment_date, appointment_time,
                  service_type, notes, status, created_at, updated_at
        "#,
    )
    .bind(date)
    .bind(time)
    .bind(id)
    .bind(contact_number)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| slot_error(e, conflict_date, conflict_time))?;

    tx.commit()
        .await
        .map_err(|e| slot_error(e, conflict_date, conflict_time))?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn booking(contact: &str, date: &str, time: &str) -> NewAppointment {
        NewAppointment {
            contact_number: contact.to_string(),
            appointment_date: date.to_string(),
            appointment_time: time.to_string(),
            service_type: Some("consultation".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_insert_creates_user_and_confirms() {
        let db = test_db().await;

        let appt = insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
        assert_eq!(appt.service_type.as_deref(), Some("consultation"));

        let user = crate::user::get_user(db.pool(), "+15551234567").await.unwrap();
        assert!(user.is_some());
        let mut conn = db.pool().acquire().await.unwrap();
        let holder = slot_holder(&mut conn, "2024-01-15", "09:00", None).await.unwrap();
        assert_eq!(holder, Some(appt.id));
    }

    #[tokio::test]
    async fn test_double_booking_rejected_across_contacts() {
        let db = test_db().await;
        insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();

        let result =
            insert_confirmed(db.pool(), &booking("+15559876543", "2024-01-15", "09:00")).await;
        assert!(matches!(result, Err(DatabaseError::SlotTaken { .. })));

        let others = list_for_contact(db.pool(), "+15559876543", None).await.unwrap();
        assert!(others.is_empty());
    }

    #[tokio::test]
    async fn test_unique_index_backs_the_precheck() {
        let db = test_db().await;
        insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();

        // Bypass the pre-check entirely: the index must still reject the row.
        let err = sqlx::query(
            r#"
            INSERT INTO appointments (contact_number, appointment_date, appointment_time, status)
            VALUES ('+15551234567', '2024-01-15', '09:00', 'confirmed')
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap_err();
        assert!(DatabaseError::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_cancelled_slot_can_be_rebooked() {
        let db = test_db().await;
        let first = insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();
        cancel(db.pool(), first.id, "+15551234567")
            .await
            .unwrap()
            .unwrap();

        let second = insert_confirmed(db.pool(), &booking("+15559876543", "2024-01-15", "09:00"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_list_orders_most_recent_first() {
        let db = test_db().await;
        let contact = "+15551234567";
        insert_confirmed(db.pool(), &booking(contact, "2024-01-15", "09:00"))
            .await
            .unwrap();
        insert_confirmed(db.pool(), &booking(contact, "2024-01-16", "10:00"))
            .await
            .unwrap();
        insert_confirmed(db.pool(), &booking(contact, "2024-01-15", "14:00"))
            .await
            .unwrap();

        let rows = list_for_contact(db.pool(), contact, None).await.unwrap();
        let slots: Vec<(String, String)> = rows
            .into_iter()
            .map(|a| (a.appointment_date, a.appointment_time))
            .collect();
        assert_eq!(
            slots,
            vec![
                ("2024-01-16".to_string(), "10:00".to_string()),
                ("2024-01-15".to_string(), "14:00".to_string()),
                ("2024-01-15".to_string(), "09:00".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = test_db().await;
        let contact = "+15551234567";
        let a = insert_confirmed(db.pool(), &booking(contact, "2024-01-15", "09:00"))
            .await
            .unwrap();
        insert_confirmed(db.pool(), &booking(contact, "2024-01-15", "10:00"))
            .await
            .unwrap();
        cancel(db.pool(), a.id, contact).await.unwrap();

        let confirmed = list_for_contact(db.pool(), contact, Some(AppointmentStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].appointment_time, "10:00");

        let cancelled = list_for_contact(db.pool(), contact, Some(AppointmentStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);

        let completed = list_for_contact(db.pool(), contact, Some(AppointmentStatus::Completed))
            .await
            .unwrap();
        assert!(completed.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_requires_owner_and_confirmed() {
        let db = test_db().await;
        let appt = insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();

        // Foreign caller
        assert!(cancel(db.pool(), appt.id, "+15559876543").await.unwrap().is_none());
        let unchanged = get_appointment(db.pool(), appt.id).await.unwrap();
        assert_eq!(unchanged.status, AppointmentStatus::Confirmed);

        // Owner
        let cancelled = cancel(db.pool(), appt.id, "+15551234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        // Already cancelled
        assert!(cancel(db.pool(), appt.id, "+15551234567").await.unwrap().is_none());

        // Unknown id
        assert!(cancel(db.pool(), 9999, "+15551234567").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reschedule_into_taken_slot_fails() {
        let db = test_db().await;
        let mine = insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();
        insert_confirmed(db.pool(), &booking("+15559876543", "2024-01-15", "10:00"))
            .await
            .unwrap();

        let result = update_date_time(
            db.pool(),
            mine.id,
            "+15551234567",
            Some("2024-01-15"),
            Some("10:00"),
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::SlotTaken { .. })));

        let unchanged = get_appointment(db.pool(), mine.id).await.unwrap();
        assert_eq!(unchanged.appointment_time, "09:00");
    }

    #[tokio::test]
    async fn test_reschedule_partial_conflict_caught_by_index() {
        let db = test_db().await;
        let mine = insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();
        insert_confirmed(db.pool(), &booking("+15559876543", "2024-01-15", "10:00"))
            .await
            .unwrap();

        let result =
            update_date_time(db.pool(), mine.id, "+15551234567", None, Some("10:00")).await;
        assert!(matches!(result, Err(DatabaseError::SlotTaken { .. })));
    }

    #[tokio::test]
    async fn test_reschedule_to_same_slot_and_new_slot() {
        let db = test_db().await;
        let mine = insert_confirmed(db.pool(), &booking("+15551234567", "2024-01-15", "09:00"))
            .await
            .unwrap();

        // Re-asserting its own slot is not a conflict.
        let same = update_date_time(
            db.pool(),
            mine.id,
            "+15551234567",
            Some("2024-01-15"),
            Some("09:00"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(same.appointment_time, "09:00");

        let moved = update_date_time(db.pool(), mine.id, "+15551234567", Some("2024-01-16"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.appointment_date, "2024-01-16");
        assert_eq!(moved.appointment_time, "09:00");

        // Wrong owner
        let foreign = update_date_time(db.pool(), mine.id, "+15559876543", None, Some("11:00"))
            .await
            .unwrap();
        assert!(foreign.is_none());
    }
}
