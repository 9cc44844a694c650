//! SurrealDB repository implementations.
//!
//! Mutations on tracked resources compose their SQL with
//! [`with_audit`], which wraps the mutation and the audit-entry append
//! in a single `BEGIN`/`COMMIT` block: if the audit write fails, the
//! mutation rolls back with it.

mod application;
mod audit;
mod cloud_platform;
mod data_store;
mod data_store_instance;
mod grant;
mod server_environment;
mod session;
mod user_profile;

pub use application::SurrealApplicationRepository;
pub use audit::SurrealAuditRepository;
pub use cloud_platform::SurrealCloudPlatformRepository;
pub use data_store::SurrealDataStoreRepository;
pub use data_store_instance::SurrealDataStoreInstanceRepository;
pub use grant::SurrealGrantRepository;
pub use server_environment::SurrealServerEnvironmentRepository;
pub use session::SurrealSessionRepository;
pub use user_profile::{SurrealUserProfileRepository, verify_password};

use chrono::{DateTime, Utc};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::models::audit::AuditAction;
use eat_core::models::kind::ResourceKind;
use eat_core::repository::AuditContext;

use crate::error::DbError;

/// SQL fragment appending one audit entry, composed after a mutation
/// inside the same transaction. Binds are prefixed `audit_` so they
/// never collide with mutation binds.
pub(crate) const AUDIT_CREATE_SQL: &str = "\
    CREATE type::record('audit_log', $audit_id) SET \
    actor_id = $audit_actor_id, \
    actor_name = $audit_actor_name, \
    action = $audit_action, \
    resource_kind = $audit_resource_kind, \
    resource_id = $audit_resource_id, \
    detail = $audit_detail, \
    ip_address = $audit_ip_address, \
    user_agent = $audit_user_agent, \
    timestamp = $audit_timestamp;";

/// Wrap mutation SQL and the audit append in one transaction.
pub(crate) fn with_audit(mutation_sql: &str) -> String {
    format!("BEGIN TRANSACTION; {mutation_sql} {AUDIT_CREATE_SQL} COMMIT TRANSACTION;")
}

/// Bind values for the audit fragment. Binding the whole struct makes
/// each field a query variable, so the names carry the `audit_`
/// prefix used by [`AUDIT_CREATE_SQL`].
#[derive(Debug, SurrealValue)]
pub(crate) struct AuditBinds {
    audit_id: String,
    audit_actor_id: Option<String>,
    audit_actor_name: String,
    audit_action: String,
    audit_resource_kind: String,
    audit_resource_id: Option<String>,
    audit_detail: serde_json::Value,
    audit_ip_address: Option<String>,
    audit_user_agent: Option<String>,
    audit_timestamp: DateTime<Utc>,
}

impl AuditBinds {
    pub(crate) fn new(
        ctx: &AuditContext,
        action: AuditAction,
        resource_kind: ResourceKind,
        resource_id: Option<String>,
        detail: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            audit_id: Uuid::new_v4().to_string(),
            audit_actor_id: ctx.actor_id.map(|u| u.to_string()),
            audit_actor_name: ctx.actor_name.clone(),
            audit_action: action.as_str().to_string(),
            audit_resource_kind: resource_kind.as_str().to_string(),
            audit_resource_id: resource_id,
            audit_detail: detail,
            audit_ip_address: ctx.ip_address.clone(),
            audit_user_agent: ctx.user_agent.clone(),
            audit_timestamp: timestamp,
        }
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(entity: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {entity} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(entity: &str, raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| parse_uuid(entity, &s)).transpose()
}
