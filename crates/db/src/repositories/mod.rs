//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods that
//! accept any [`sqlx::PgExecutor`] as the first argument: `&PgPool` for
//! standalone calls, `&mut *tx` inside a transaction.

pub mod audit_event_repo;
pub mod document_template_repo;
pub mod event_template_repo;
pub mod gateway_template_repo;
pub mod number_template_repo;
pub mod task_template_repo;
pub mod unit_repo;
pub mod workflow_history_repo;
pub mod workflow_instance_repo;
pub mod workflow_template_category_repo;
pub mod workflow_template_repo;

pub use audit_event_repo::AuditEventRepo;
pub use document_template_repo::DocumentTemplateRepo;
pub use event_template_repo::EventTemplateRepo;
pub use gateway_template_repo::GatewayTemplateRepo;
pub use number_template_repo::NumberTemplateRepo;
pub use task_template_repo::TaskTemplateRepo;
pub use unit_repo::UnitRepo;
pub use workflow_history_repo::WorkflowHistoryRepo;
pub use workflow_instance_repo::WorkflowInstanceRepo;
pub use workflow_template_category_repo::WorkflowTemplateCategoryRepo;
pub use workflow_template_repo::WorkflowTemplateRepo;
