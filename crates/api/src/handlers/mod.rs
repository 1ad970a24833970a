//! HTTP handlers, one module per resource concern.

pub mod workflow_copy;
pub mod workflow_history;
pub mod workflow_template;
pub mod workflow_transfer;
