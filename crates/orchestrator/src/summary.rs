//! End-of-session summaries.

use std::sync::Arc;
use std::time::Duration;

use agent_tools::CostRates;
use brain_core::{BrainError, SummaryText, Summarizer};
use database::{AppointmentStore, ConversationSummary, NewConversationSummary};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::preferences::extract_preferences;
use crate::session::Session;

/// Digest stored when the summarizer fails.
pub const PLACEHOLDER_SUMMARY: &str = "Summary unavailable for this conversation.";

/// Derives and persists the summary of an ended session.
pub struct SummaryFinalizer {
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn AppointmentStore>,
    rates: CostRates,
    max_words: usize,
    deadline: Option<Duration>,
}

impl SummaryFinalizer {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn AppointmentStore>,
        rates: CostRates,
    ) -> Self {
        Self {
            summarizer,
            store,
            rates,
            max_words: crate::settings::DEFAULT_SUMMARY_MAX_WORDS,
            deadline: None,
        }
    }

    /// Bound the digest to `max_words` words.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    /// Wrap the summarizer call in a deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Summarize and persist `session`.
    ///
    /// Does nothing if no caller was identified. Never fails: summarizer
    /// errors fall back to [`PLACEHOLDER_SUMMARY`] and persistence errors are
    /// logged, returning `None`.
    pub async fn finalize(&self, session: &Session) -> Option<ConversationSummary> {
        let Some(contact_number) = session.contact_number() else {
            info!("Session {} ended without an identified caller, no summary", session.id());
            return None;
        };

        let booked = session.booked_json();
        let summary = match self.summarize(session, &booked).await {
            Ok(text) => {
                if let Some(usage) = text.usage {
                    session
                        .ledger()
                        .push(self.rates.summary_entry(usage).for_session(session.id()))
                        .await;
                }
                truncate_words(&text.text, self.max_words)
            }
            Err(e) => {
                warn!("Summarizer failed for session {}: {}", session.id(), e);
                PLACEHOLDER_SUMMARY.to_string()
            }
        };

        let record = NewConversationSummary {
            contact_number: Some(contact_number.to_string()),
            session_id: session.id().to_string(),
            summary,
            booked_appointments: booked,
            preferences: extract_preferences(session.transcript()),
            cost_breakdown: session.costs().await.to_value(),
        };

        match self.store.insert_summary(&record).await {
            Ok(stored) => {
                info!("Persisted summary {} for session {}", stored.id, session.id());
                Some(stored)
            }
            Err(e) => {
                warn!("Failed to persist summary for session {}: {}", session.id(), e);
                None
            }
        }
    }

    async fn summarize(
        &self,
        session: &Session,
        booked: &[serde_json::Value],
    ) -> Result<SummaryText, BrainError> {
        let call = self.summarizer.summarize(session.transcript(), booked);
        match self.deadline {
            Some(limit) => timeout(limit, call).await.map_err(|_| BrainError::Timeout)?,
            None => call.await,
        }
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return PLACEHOLDER_SUMMARY.to_string();
    }
    if words.len() <= max_words {
        return words.join(" ");
    }
    format!("{}...", words[..max_words].join(" "))
}
