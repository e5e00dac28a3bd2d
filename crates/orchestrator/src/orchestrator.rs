//! The turn-taking loop that owns sessions.

use std::collections::HashMap;
use std::sync::Arc;

use agent_tools::{CostLedger, CostSnapshot, DispatchContext, ToolError, ToolOutput, ToolRegistry};
use brain_core::{Brain, BrainAction, BrainError, BrainReply, ToolDefinition, Turn};
use database::ConversationSummary;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::OrchestratorError;
use crate::session::{Session, SessionSnapshot, ToolCallRecord};
use crate::settings::OrchestratorSettings;
use crate::summary::SummaryFinalizer;

/// System prompt placed at the top of every new session.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a scheduling assistant on a phone line.

Identify the caller with identify_user before booking or looking up appointments.
Offer slots from fetch_slots. If a booking fails because the slot is taken, offer another slot.
Confirm dates and times back to the caller. Call end_conversation when they are done."#;

/// One inbound event for a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Something the caller said.
    UserUtterance(String),
    /// An operation the model asked to run.
    ToolCall {
        name: String,
        arguments: HashMap<String, Value>,
    },
    /// A reply the model produced.
    AssistantReply(String),
}

/// Result of one user turn.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    /// What to say back. `None` when the turn ended the conversation.
    pub reply: Option<String>,
    /// Operations executed during the turn.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Whether the session is now sealed.
    pub ended: bool,
    /// The persisted summary, if this turn ended the conversation.
    pub summary: Option<ConversationSummary>,
    /// Ledger state after the turn.
    pub costs: CostSnapshot,
}

/// Drives conversations between callers and the model.
///
/// Each session processes one event at a time; different sessions run
/// concurrently and share only the appointment store and, when configured,
/// the cost ledger.
pub struct Orchestrator {
    brain: Arc<dyn Brain>,
    registry: Arc<ToolRegistry>,
    finalizer: SummaryFinalizer,
    settings: OrchestratorSettings,
    system_prompt: Option<String>,
    shared_ledger: Option<Arc<CostLedger>>,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(
        brain: Arc<dyn Brain>,
        registry: Arc<ToolRegistry>,
        finalizer: SummaryFinalizer,
        settings: OrchestratorSettings,
    ) -> Self {
        let finalizer = finalizer
            .with_max_words(settings.summary_max_words)
            .with_deadline(settings.model_timeout);
        let shared_ledger = settings
            .shared_ledger
            .then(|| Arc::new(CostLedger::new()));

        Self {
            brain,
            registry,
            finalizer,
            settings,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            shared_ledger,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the system prompt. `None` starts sessions with an empty transcript.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Bill every session to `ledger`.
    pub fn with_shared_ledger(mut self, ledger: Arc<CostLedger>) -> Self {
        self.shared_ledger = Some(ledger);
        self
    }

    /// The operation catalog advertised to the model.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Process one user utterance: consult the model, run any tool calls it
    /// asks for, and re-consult it until it replies or ends the call.
    pub async fn handle_utterance(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TurnResponse, OrchestratorError> {
        self.handle_utterance_with_cancel(session_id, text, None)
            .await
    }

    /// [`handle_utterance`](Self::handle_utterance) with a token that aborts
    /// in-flight tool calls.
    pub async fn handle_utterance_with_cancel(
        &self,
        session_id: &str,
        text: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<TurnResponse, OrchestratorError> {
        let handle = self.session(session_id).await;
        let mut session = handle.lock().await;
        ensure_active(&session)?;

        info!("Session {}: user turn", session_id);
        session.push_turn(Turn::user(text));

        let definitions = self.registry.definitions();
        let mut executed = Vec::new();

        for round in 0..=self.settings.max_tool_rounds {
            let reply = self.consult_model(&session, &definitions).await?;

            let calls = match reply.action {
                BrainAction::Speak(text) => {
                    session.push_turn(Turn::assistant(text.clone()));
                    return Ok(self.turn_response(&session, Some(text), executed).await);
                }
                BrainAction::CallTools(calls) => calls,
            };

            if round == self.settings.max_tool_rounds {
                warn!(
                    "Session {}: model still calling tools after {} rounds",
                    session_id, round
                );
                return Err(OrchestratorError::ToolLoopLimit(round));
            }

            for call in calls {
                if session.is_ended() {
                    debug!("Session {}: dropping '{}' after end", session_id, call.name);
                    continue;
                }
                match self
                    .run_tool_call(&mut session, &call.name, call.arguments, cancel)
                    .await
                {
                    Ok(record) => executed.push(record),
                    Err(OrchestratorError::Tool(err @ ToolError::UnknownOperation(_))) => {
                        warn!("Session {}: {}", session_id, err);
                        session.push_turn(Turn::tool_result(
                            call.name.as_str(),
                            ToolOutput::failure(&err).to_json(),
                        ));
                    }
                    Err(e) => return Err(e),
                }
            }

            if session.is_ended() {
                return Ok(self.turn_response(&session, None, executed).await);
            }
        }

        Err(OrchestratorError::ToolLoopLimit(self.settings.max_tool_rounds))
    }

    /// Apply a single event to a session.
    ///
    /// Returns the call record for [`SessionEvent::ToolCall`]. Fails with
    /// `SessionEnded` once the session is sealed, without touching state or
    /// the ledger.
    pub async fn apply(
        &self,
        session_id: &str,
        event: SessionEvent,
    ) -> Result<Option<ToolCallRecord>, OrchestratorError> {
        self.apply_with_cancel(session_id, event, None).await
    }

    /// [`apply`](Self::apply) with a token that aborts an in-flight tool call.
    pub async fn apply_with_cancel(
        &self,
        session_id: &str,
        event: SessionEvent,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<ToolCallRecord>, OrchestratorError> {
        let handle = self.session(session_id).await;
        let mut session = handle.lock().await;
        ensure_active(&session)?;

        match event {
            SessionEvent::UserUtterance(text) => {
                session.push_turn(Turn::user(text));
                Ok(None)
            }
            SessionEvent::AssistantReply(text) => {
                session.push_turn(Turn::assistant(text));
                Ok(None)
            }
            SessionEvent::ToolCall { name, arguments } => self
                .run_tool_call(&mut session, &name, arguments, cancel)
                .await
                .map(Some),
        }
    }

    /// Read-only copy of a session, if it exists.
    pub async fn session_snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        let session = handle.lock().await;
        Some(session.snapshot().await)
    }

    /// Drop a sealed session from the registry. Active sessions are kept;
    /// returns whether a session was removed.
    pub async fn end_session(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(handle) = sessions.get(session_id) else {
            return false;
        };
        // A session busy with an event is still active.
        let sealed = handle.try_lock().map(|s| s.is_ended()).unwrap_or(false);
        if !sealed {
            return false;
        }
        sessions.remove(session_id);
        info!("Session {} released", session_id);
        true
    }

    /// Number of sessions currently held.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn session(&self, session_id: &str) -> Arc<Mutex<Session>> {
        if let Some(handle) = self.sessions.read().await.get(session_id) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!("Session {} created", session_id);
                let ledger = self
                    .shared_ledger
                    .clone()
                    .unwrap_or_else(|| Arc::new(CostLedger::new()));
                let mut session = Session::new(session_id, ledger);
                if let Some(prompt) = &self.system_prompt {
                    session.push_turn(Turn::system(prompt.as_str()));
                }
                Arc::new(Mutex::new(session))
            })
            .clone()
    }

    async fn consult_model(
        &self,
        session: &Session,
        definitions: &[ToolDefinition],
    ) -> Result<BrainReply, OrchestratorError> {
        let call = self.brain.respond(session.transcript(), definitions);
        let reply = match self.settings.model_timeout {
            Some(limit) => timeout(limit, call).await.map_err(|_| {
                warn!("Session {}: model timed out after {:?}", session.id(), limit);
                BrainError::Timeout
            })?,
            None => call.await,
        }?;

        if let Some(usage) = reply.usage {
            session
                .ledger()
                .push(self.registry.rates().llm_entry(usage).for_session(session.id()))
                .await;
        }
        Ok(reply)
    }

    async fn run_tool_call(
        &self,
        session: &mut Session,
        name: &str,
        arguments: HashMap<String, Value>,
        cancel: Option<&CancellationToken>,
    ) -> Result<ToolCallRecord, OrchestratorError> {
        let ledger = session.ledger.clone();
        let session_id = session.id.clone();
        let mut ctx = DispatchContext::new(&ledger)
            .with_deadline(self.settings.tool_timeout)
            .with_session(&session_id);
        if let Some(token) = cancel {
            ctx = ctx.with_cancel(token);
        }

        let output = self
            .registry
            .dispatch(name, arguments.clone(), &ctx)
            .await?;

        debug!(
            "Session {}: '{}' -> success={}",
            session.id(),
            name,
            output.success
        );

        let record = session.record_call(name, arguments, output);
        if session.is_ended() {
            info!("Session {} ended, finalizing", session.id());
            session.summary = self.finalizer.finalize(session).await;
        }

        Ok(record)
    }

    async fn turn_response(
        &self,
        session: &Session,
        reply: Option<String>,
        tool_calls: Vec<ToolCallRecord>,
    ) -> TurnResponse {
        TurnResponse {
            reply,
            tool_calls,
            ended: session.is_ended(),
            summary: session.summary.clone(),
            costs: session.costs().await,
        }
    }
}

fn ensure_active(session: &Session) -> Result<(), OrchestratorError> {
    if session.is_ended() {
        return Err(OrchestratorError::SessionEnded(session.id().to_string()));
    }
    Ok(())
}
