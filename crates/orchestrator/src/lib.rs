//! Conversation orchestration for the scheduling assistant.
//!
//! This crate provides the [`Orchestrator`] type, which owns one
//! [`Session`] per conversation and runs the turn loop between the caller,
//! the model and the scheduling tools.
//!
//! # Architecture
//!
//! ```text
//! User utterance
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Append the utterance to the session transcript          │
//! │         ↓                                                   │
//! │  2. Consult the model with the transcript + tool catalog    │
//! │         ↓                                                   │
//! │  3. For each requested tool call:                           │
//! │     • dispatch through the ToolRegistry (billed once)       │
//! │     • append the result envelope as a tool-result turn      │
//! │     • fold effects (caller identified, booking, update)     │
//! │         ↓                                                   │
//! │  4. Re-consult the model until it replies                   │
//! │         ↓                                                   │
//! │  5. On end_conversation: seal session, persist summary      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_tools::{scheduling_registry, CostRates, StaticCalendar};
//! use orchestrator::{Orchestrator, OrchestratorSettings, SummaryFinalizer};
//!
//! let store = Arc::new(database::Database::connect("sqlite:scheduler.db?mode=rwc").await?);
//! store.migrate().await?;
//!
//! let registry = Arc::new(scheduling_registry(store.clone(), Arc::new(StaticCalendar::sample())));
//! let finalizer = SummaryFinalizer::new(summarizer, store, CostRates::default());
//! let orchestrator = Orchestrator::new(brain, registry, finalizer, OrchestratorSettings::from_env());
//!
//! let turn = orchestrator.handle_utterance("call-42", "Do you have anything Monday?").await?;
//! println!("{:?}", turn.reply);
//! ```

mod error;
mod orchestrator;
pub mod preferences;
mod session;
mod settings;
mod summary;

pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, SessionEvent, TurnResponse, DEFAULT_SYSTEM_PROMPT};
pub use preferences::extract_preferences;
pub use session::{Session, SessionSnapshot, ToolCallRecord};
pub use settings::OrchestratorSettings;
pub use summary::{SummaryFinalizer, PLACEHOLDER_SUMMARY};
