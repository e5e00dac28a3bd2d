//! SQLite persistence layer for the scheduling assistant.
//!
//! This crate provides async database operations for callers, appointments
//! and end-of-session summaries using SQLx with SQLite, plus the
//! [`AppointmentStore`] contract the scheduling tools are written against.
//!
//! # Example
//!
//! ```no_run
//! use database::{appointment, Database, NewAppointment};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:scheduler.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Book a slot
//!     let booked = appointment::insert_confirmed(
//!         db.pool(),
//!         &NewAppointment {
//!             contact_number: "+15551234567".to_string(),
//!             appointment_date: "2024-01-15".to_string(),
//!             appointment_time: "09:00".to_string(),
//!             service_type: None,
//!             notes: None,
//!         },
//!     )
//!     .await?;
//!     println!("booked #{}", booked.id);
//!
//!     Ok(())
//! }
//! ```

pub mod appointment;
pub mod conversation_summary;
pub mod error;
pub mod models;
pub mod store;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Appointment, AppointmentStatus, ConversationSummary, NewAppointment, NewConversationSummary,
    User,
};
pub use store::AppointmentStore;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent sessions.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/scheduler.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn file_db(dir: &tempfile::TempDir) -> Database {
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("scheduler.db").display());
        let db = Database::connect_with_pool_size(&url, 16).await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn booking(contact: String, date: &str, time: &str) -> NewAppointment {
        NewAppointment {
            contact_number: contact,
            appointment_date: date.to_string(),
            appointment_time: time.to_string(),
            service_type: None,
            notes: None,
        }
    }

    /// Tally a batch of racing writes into (succeeded, slot taken).
    async fn tally<T: Send + 'static>(
        handles: Vec<tokio::task::JoinHandle<Result<T>>>,
    ) -> (usize, usize) {
        let mut ok = 0;
        let mut taken = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DatabaseError::SlotTaken { .. }) => taken += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        (ok, taken)
    }

    async fn confirmed_at(db: &Database, date: &str, time: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM appointments
             WHERE appointment_date = ? AND appointment_time = ? AND status = 'confirmed'",
        )
        .bind(date)
        .bind(time)
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    /// Book one distinct morning slot per caller, returning (id, contact) pairs.
    async fn seed_appointments(db: &Database, count: usize) -> Vec<(i64, String)> {
        let mut seeded = Vec::new();
        for i in 0..count {
            let contact = format!("+155500001{:02}", i);
            let time = format!("{:02}:00", 6 + i);
            let appt = db
                .insert_confirmed_appointment(&booking(contact.clone(), "2024-01-20", &time))
                .await
                .unwrap();
            seeded.push((appt.id, contact));
        }
        seeded
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.insert_confirmed_appointment(&booking(
                    format!("+155500000{:02}", i),
                    "2024-01-15",
                    "09:00",
                ))
                .await
            }));
        }

        assert_eq!(tally(handles).await, (1, 15));
        assert_eq!(confirmed_at(&db, "2024-01-15", "09:00").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reschedules_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let seeded = seed_appointments(&db, 12).await;

        let mut handles = Vec::new();
        for (id, contact) in seeded {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.update_date_time(id, &contact, Some("2024-02-01"), Some("10:00"))
                    .await
                    .map(|row| row.expect("appointment is owned and confirmed"))
            }));
        }

        assert_eq!(tally(handles).await, (1, 11));
        assert_eq!(confirmed_at(&db, "2024-02-01", "10:00").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bookings_race_reschedules_for_one_slot() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let seeded = seed_appointments(&db, 8).await;

        let mut moves = Vec::new();
        for (id, contact) in seeded {
            let db = db.clone();
            moves.push(tokio::spawn(async move {
                db.update_date_time(id, &contact, Some("2024-02-01"), Some("10:00"))
                    .await
                    .map(|row| row.expect("appointment is owned and confirmed"))
                    .map(|_| ())
            }));
        }
        let mut bookings = Vec::new();
        for i in 0..8 {
            let db = db.clone();
            bookings.push(tokio::spawn(async move {
                db.insert_confirmed_appointment(&booking(
                    format!("+155500002{:02}", i),
                    "2024-02-01",
                    "10:00",
                ))
                .await
                .map(|_| ())
            }));
        }

        let (moved, move_taken) = tally(moves).await;
        let (booked, book_taken) = tally(bookings).await;
        assert_eq!(moved + booked, 1);
        assert_eq!(move_taken + book_taken, 15);
        assert_eq!(confirmed_at(&db, "2024-02-01", "10:00").await, 1);
    }

    #[tokio::test]
    async fn test_store_trait_roundtrip() {
        let db = test_db().await;
        let store: &dyn AppointmentStore = &db;

        let user = store
            .upsert_user("+15551234567", Some("Ada"), None)
            .await
            .unwrap();
        assert_eq!(store.get_user(&user.contact_number).await.unwrap(), Some(user));

        let appt = store
            .insert_confirmed_appointment(&NewAppointment {
                contact_number: "+15551234567".to_string(),
                appointment_date: "2024-01-15".to_string(),
                appointment_time: "09:00".to_string(),
                service_type: None,
                notes: Some("first visit".to_string()),
            })
            .await
            .unwrap();

        let completed = store
            .set_status(appt.id, "+15551234567", AppointmentStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);

        let listed = store
            .list_appointments("+15551234567", Some(AppointmentStatus::Completed))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
