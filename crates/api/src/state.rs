use std::sync::Arc;

use procflow_engine::{
    CopyService, GraphResolver, RegisterKeyDirectory, StagedCopyStore, TransferService,
    UnitDirectory, VersionManager, WorkflowTemplateService,
};
use procflow_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: procflow_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing audit events.
    pub event_bus: Arc<EventBus>,
    pub templates: Arc<WorkflowTemplateService>,
    pub versions: Arc<VersionManager>,
    pub transfer: Arc<TransferService>,
    pub copy: Arc<CopyService>,
    /// Prepared copies awaiting commit, swept by a background task.
    pub staged_copies: Arc<StagedCopyStore>,
}

impl AppState {
    /// Wire every service against one pool and event bus.
    pub fn new(
        pool: procflow_db::DbPool,
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        register_keys: Arc<dyn RegisterKeyDirectory>,
        units: Arc<dyn UnitDirectory>,
    ) -> Self {
        let engine = &config.engine;
        let resolver = GraphResolver::new(pool.clone());
        let versions = Arc::new(VersionManager::new(
            pool.clone(),
            resolver.clone(),
            Arc::clone(&event_bus),
            engine,
        ));
        let staged_copies = Arc::new(StagedCopyStore::new());

        let templates = Arc::new(WorkflowTemplateService::new(
            pool.clone(),
            resolver.clone(),
            Arc::clone(&versions),
            Arc::clone(&event_bus),
            engine,
        ));
        let transfer = Arc::new(TransferService::new(
            pool.clone(),
            resolver.clone(),
            Arc::clone(&versions),
            register_keys,
            units,
            Arc::clone(&event_bus),
        ));
        let copy = Arc::new(CopyService::new(
            pool.clone(),
            resolver,
            Arc::clone(&staged_copies),
            Arc::clone(&event_bus),
            engine,
        ));

        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            templates,
            versions,
            transfer,
            copy,
            staged_copies,
        }
    }
}
