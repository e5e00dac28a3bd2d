//! Summarizer test doubles.

use async_trait::async_trait;
use brain_core::{BrainError, SummaryText, Summarizer, TokenUsage, Turn};
use serde_json::Value;

/// Always returns the same digest.
#[derive(Debug, Clone)]
pub struct StaticSummarizer {
    text: String,
    usage: Option<TokenUsage>,
}

impl StaticSummarizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    /// Report `usage` with every summary.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(
        &self,
        _transcript: &[Turn],
        _booked_appointments: &[Value],
    ) -> Result<SummaryText, BrainError> {
        let summary = SummaryText::new(self.text.clone());
        Ok(match self.usage {
            Some(usage) => summary.with_usage(usage),
            None => summary,
        })
    }
}

/// Always fails, as an unreachable summarization service would.
#[derive(Debug, Clone, Default)]
pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _transcript: &[Turn],
        _booked_appointments: &[Value],
    ) -> Result<SummaryText, BrainError> {
        Err(BrainError::Unavailable("summarizer offline".to_string()))
    }
}

/// Builds a plain digest from the transcript without any model.
///
/// Lists what the caller asked for and the final state of each booked
/// appointment.
#[derive(Debug, Clone, Default)]
pub struct DigestSummarizer;

#[async_trait]
impl Summarizer for DigestSummarizer {
    async fn summarize(
        &self,
        transcript: &[Turn],
        booked_appointments: &[Value],
    ) -> Result<SummaryText, BrainError> {
        let requests: Vec<&str> = transcript
            .iter()
            .filter(|turn| turn.is_user())
            .map(|turn| turn.content.trim())
            .filter(|content| !content.is_empty())
            .collect();

        let mut text = format!("Caller made {} requests.", requests.len());
        if let Some(first) = requests.first() {
            text.push_str(&format!(" Opened with: \"{}\".", first));
        }

        if booked_appointments.is_empty() {
            text.push_str(" No appointments were booked.");
        } else {
            for appointment in booked_appointments {
                text.push_str(&format!(
                    " Appointment {} on {} at {} is {}.",
                    appointment["id"],
                    appointment["appointment_date"].as_str().unwrap_or("?"),
                    appointment["appointment_time"].as_str().unwrap_or("?"),
                    appointment["status"].as_str().unwrap_or("unknown"),
                ));
            }
        }

        Ok(SummaryText::new(text))
    }
}
