//! Domain logic for BPMN workflow templates.
//!
//! Everything in this crate is pure: no database, no network. The engine
//! crate wires these building blocks to repositories and collaborators.

pub mod bpmn;
pub mod error;
pub mod expression;
pub mod id_rewrite;
pub mod schema_scan;
pub mod types;
pub mod versioning;
