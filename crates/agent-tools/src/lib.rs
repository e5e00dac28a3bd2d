//! Tool registry, scheduling operations and cost ledger for the scheduling
//! assistant.
//!
//! This crate provides a [`ToolRegistry`] holding the fixed catalog of
//! operations the model may call, and a dispatcher that runs a requested
//! operation against the appointment store or slot catalog, bills it to a
//! [`CostLedger`] and always answers with a uniform [`ToolOutput`] envelope.
//!
//! # Operations
//!
//! - [`IdentifyUser`] - upsert the caller's record.
//! - [`FetchSlots`] - list available calendar slots.
//! - [`BookAppointment`] - conflict-checked booking.
//! - [`RetrieveAppointments`] - the caller's appointments, most recent first.
//! - [`CancelAppointment`] - cancel an owned confirmed appointment.
//! - [`ModifyAppointment`] - reschedule an owned confirmed appointment.
//! - [`EndConversation`] - end-of-call signal.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_tools::{scheduling_registry, CostLedger, DispatchContext, StaticCalendar};
//!
//! let registry = scheduling_registry(store, Arc::new(StaticCalendar::sample()));
//! let ledger = CostLedger::new();
//! let output = registry
//!     .dispatch_json("fetch_slots", r#"{"date": "2024-01-15"}"#, &DispatchContext::new(&ledger))
//!     .await?;
//! println!("{}", output.to_json());
//! ```

mod error;
pub mod ledger;
mod registry;
pub mod slots;
mod tool;
pub mod tools;

use std::sync::Arc;

use database::AppointmentStore;

pub use error::{ErrorKind, ToolError};
pub use ledger::{CostEntry, CostLedger, CostRates, CostSnapshot, CostUnit};
pub use registry::{DispatchContext, ToolRegistry};
pub use slots::{Slot, SlotCatalog, StaticCalendar};
pub use tool::{Tool, ToolArgs, ToolEffect, ToolOutput};
pub use tools::{
    BookAppointment, CancelAppointment, EndConversation, FetchSlots, IdentifyUser,
    ModifyAppointment, RetrieveAppointments, OPERATION_NAMES,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a registry with every scheduling operation, billed at default rates.
pub fn scheduling_registry(
    store: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn SlotCatalog>,
) -> ToolRegistry {
    scheduling_registry_with_rates(store, catalog, CostRates::default())
}

/// Create a registry with every scheduling operation, billed at `rates`.
pub fn scheduling_registry_with_rates(
    store: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn SlotCatalog>,
    rates: CostRates,
) -> ToolRegistry {
    let mut registry = ToolRegistry::with_rates(rates);

    registry.register(IdentifyUser::new(store.clone()));
    registry.register(FetchSlots::new(catalog));
    registry.register(BookAppointment::new(store.clone()));
    registry.register(RetrieveAppointments::new(store.clone()));
    registry.register(CancelAppointment::new(store.clone()));
    registry.register(ModifyAppointment::new(store));
    registry.register(EndConversation::new());

    registry
}
