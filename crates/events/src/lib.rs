//! Audit trail for workflow template mutations.
//!
//! - [`EventBus`] is an in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Publishing never fails the caller.
//! - [`WorkflowEvent`] is the event envelope.
//! - [`EventPersistence`] writes every event to the `audit_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{event_types, EventBus, WorkflowEvent};
pub use persistence::EventPersistence;
