//! Workflow template services.
//!
//! Each service is built once at startup and shared behind an `Arc`:
//!
//! - [`GraphResolver`] walks a template's BPMN graph to its dependents.
//! - [`VersionManager`] owns the history ledger and auto-save debounce.
//! - [`WorkflowTemplateService`] handles create, update and cascading delete.
//! - [`TransferService`] exports and imports whole graphs.
//! - [`CopyService`] duplicates a graph in two phases through the
//!   [`StagedCopyStore`].

pub mod actor;
pub mod config;
pub mod copy;
pub mod directory;
pub mod error;
pub mod graph;
pub mod staging;
pub mod templates;
pub mod transfer;
pub mod versions;

pub use actor::{Actor, RequestMeta};
pub use config::EngineConfig;
pub use copy::{CopyPreparation, CopyResult, CopyService, Diff, StagedCopy};
pub use directory::{
    HttpRegisterKeyDirectory, PgUnitDirectory, RegisterKeyDirectory, UnitDirectory,
};
pub use error::EngineError;
pub use graph::{GraphResolver, ResolvedGraph};
pub use staging::StagedCopyStore;
pub use templates::WorkflowTemplateService;
pub use transfer::{ImportOptions, TransferService};
pub use versions::{SaveVersionRequest, VersionManager};
