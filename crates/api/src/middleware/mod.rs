//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`actor::RequestActor`] -- The authenticated user plus request metadata.
//! - [`history::LastHistoryId`] -- The `Last-Workflow-History-Id` request header.

pub mod actor;
pub mod auth;
pub mod history;
