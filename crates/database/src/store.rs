//! The persistence contract used by the scheduling tools.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Appointment, AppointmentStatus, ConversationSummary, NewAppointment, NewConversationSummary,
    User,
};
use crate::{appointment, conversation_summary, user, Database};

/// CRUD plus conflict-checked booking over users, appointments and summaries.
///
/// Implementations must guarantee that at most one confirmed appointment
/// holds a `(date, time)` slot, and report a losing write as
/// [`DatabaseError::SlotTaken`](crate::DatabaseError::SlotTaken).
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Create or refresh a user, merging present fields over stored ones.
    async fn upsert_user(
        &self,
        contact_number: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User>;

    /// Look up a user.
    async fn get_user(&self, contact_number: &str) -> Result<Option<User>>;

    /// Book a slot, failing with `SlotTaken` if it is held.
    async fn insert_confirmed_appointment(&self, new: &NewAppointment) -> Result<Appointment>;

    /// A caller's appointments, most recent slot first.
    async fn list_appointments(
        &self,
        contact_number: &str,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>>;

    /// Move an owned confirmed appointment to `status`; `None` if nothing matched.
    async fn set_status(
        &self,
        id: i64,
        contact_number: &str,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>>;

    /// Reschedule an owned confirmed appointment; `None` if nothing matched.
    async fn update_date_time(
        &self,
        id: i64,
        contact_number: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Option<Appointment>>;

    /// Persist an end-of-session summary.
    async fn insert_summary(&self, summary: &NewConversationSummary)
        -> Result<ConversationSummary>;
}

#[async_trait]
impl AppointmentStore for Database {
    async fn upsert_user(
        &self,
        contact_number: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        user::upsert_user(self.pool(), contact_number, name, email).await
    }

    async fn get_user(&self, contact_number: &str) -> Result<Option<User>> {
        user::get_user(self.pool(), contact_number).await
    }

    async fn insert_confirmed_appointment(&self, new: &NewAppointment) -> Result<Appointment> {
        appointment::insert_confirmed(self.pool(), new).await
    }

    async fn list_appointments(
        &self,
        contact_number: &str,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>> {
        appointment::list_for_contact(self.pool(), contact_number, status).await
    }

    async fn set_status(
        &self,
        id: i64,
        contact_number: &str,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>> {
        appointment::set_status(self.pool(), id, contact_number, status).await
    }

    async fn update_date_time(
        &self,
        id: i64,
        contact_number: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Option<Appointment>> {
        appointment::update_date_time(self.pool(), id, contact_number, date, time).await
    }

    async fn insert_summary(
        &self,
        summary: &NewConversationSummary,
    ) -> Result<ConversationSummary> {
        conversation_summary::insert_summary(self.pool(), summary).await
    }
}
