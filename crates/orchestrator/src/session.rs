//! Per-conversation state.

use std::collections::HashMap;
use std::sync::Arc;

use agent_tools::{CostLedger, CostSnapshot, ToolEffect, ToolOutput};
use brain_core::Turn;
use database::{Appointment, ConversationSummary};
use serde::Serialize;
use serde_json::Value;

/// One executed operation within a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    /// Operation name.
    pub name: String,
    /// Arguments as sent by the model.
    pub arguments: HashMap<String, Value>,
    /// Result envelope.
    pub result: ToolOutput,
}

/// State of one conversation.
///
/// Only the orchestrator mutates a session, one event at a time. Once
/// `ended` is set nothing else changes.
#[derive(Debug)]
pub struct Session {
    pub(crate) id: String,
    pub(crate) contact_number: Option<String>,
    pub(crate) transcript: Vec<Turn>,
    pub(crate) tool_calls: Vec<ToolCallRecord>,
    pub(crate) booked_appointments: Vec<Appointment>,
    pub(crate) ended: bool,
    pub(crate) summary: Option<ConversationSummary>,
    pub(crate) ledger: Arc<CostLedger>,
}

impl Session {
    pub(crate) fn new(id: impl Into<String>, ledger: Arc<CostLedger>) -> Self {
        Self {
            id: id.into(),
            contact_number: None,
            transcript: Vec::new(),
            tool_calls: Vec::new(),
            booked_appointments: Vec::new(),
            ended: false,
            summary: None,
            ledger,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contact_number(&self) -> Option<&str> {
        self.contact_number.as_deref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn booked_appointments(&self) -> &[Appointment] {
        &self.booked_appointments
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Append a turn to the transcript.
    pub(crate) fn push_turn(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    /// Fold a dispatched call into the session: transcript, record and any
    /// effect. Sets `ended` when the call ends the conversation.
    pub(crate) fn record_call(
        &mut self,
        name: &str,
        arguments: HashMap<String, Value>,
        result: ToolOutput,
    ) -> ToolCallRecord {
        self.transcript
            .push(Turn::tool_result(name, result.to_json()));

        let mut ends = false;
        if result.success {
            match &result.effect {
                Some(ToolEffect::Identified(user)) => {
                    self.contact_number = Some(user.contact_number.clone());
                }
                Some(ToolEffect::Booked(appointment)) => {
                    self.booked_appointments.push(appointment.clone());
                }
                Some(ToolEffect::Updated(appointment)) => {
                    if let Some(existing) = self
                        .booked_appointments
                        .iter_mut()
                        .find(|a| a.id == appointment.id)
                    {
                        *existing = appointment.clone();
                    }
                }
                Some(ToolEffect::EndConversation) => ends = true,
                None => {}
            }
        }

        let record = ToolCallRecord {
            name: name.to_string(),
            arguments,
            result,
        };
        self.tool_calls.push(record.clone());

        if ends {
            self.ended = true;
        }
        record
    }

    /// Booked appointments as JSON, for the summary.
    pub(crate) fn booked_json(&self) -> Vec<Value> {
        self.booked_appointments
            .iter()
            .filter_map(|a| serde_json::to_value(a).ok())
            .collect()
    }

    /// This session's cost breakdown, even when the ledger is shared.
    pub(crate) async fn costs(&self) -> CostSnapshot {
        self.ledger.snapshot_for(&self.id).await
    }

    pub(crate) async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            contact_number: self.contact_number.clone(),
            transcript: self.transcript.clone(),
            tool_calls: self.tool_calls.clone(),
            booked_appointments: self.booked_appointments.clone(),
            ended: self.ended,
            summary: self.summary.clone(),
            costs: self.costs().await,
        }
    }
}

/// Read-only copy of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub contact_number: Option<String>,
    pub transcript: Vec<Turn>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub booked_appointments: Vec<Appointment>,
    pub ended: bool,
    /// The persisted summary, once the session has been finalized.
    pub summary: Option<ConversationSummary>,
    pub costs: CostSnapshot,
}
