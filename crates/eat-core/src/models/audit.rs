//! Audit log domain model.
//!
//! Entries are immutable and append-only. No API path updates or
//! deletes an existing entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::kind::ResourceKind;

/// Name recorded for actions not attributable to a user account.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
    Login,
    LoginFailed,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::View => "VIEW",
            AuditAction::Login => "LOGIN",
            AuditAction::LoginFailed => "LOGIN_FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<AuditAction> {
        match s {
            "CREATE" => Some(AuditAction::Create),
            "UPDATE" => Some(AuditAction::Update),
            "DELETE" => Some(AuditAction::Delete),
            "VIEW" => Some(AuditAction::View),
            "LOGIN" => Some(AuditAction::Login),
            "LOGIN_FAILED" => Some(AuditAction::LoginFailed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// `None` for system actions and failed logins with no resolvable
    /// account.
    pub actor_id: Option<Uuid>,
    /// Username snapshot at the time of the action ([`SYSTEM_ACTOR`]
    /// when there is no actor).
    pub actor_name: String,
    pub action: AuditAction,
    pub resource_kind: ResourceKind,
    pub resource_id: Option<String>,
    /// CREATE: flat map of initial values. UPDATE: changed fields only,
    /// each as `{"old": .., "new": ..}`. DELETE: snapshot immediately
    /// before removal.
    pub detail: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub action: AuditAction,
    pub resource_kind: ResourceKind,
    pub resource_id: Option<String>,
    pub detail: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Filter for the audit read API. All fields are conjunctive; `None`
/// means "any".
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub resource_kind: Option<ResourceKind>,
    pub resource_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}
