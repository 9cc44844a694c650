//! Record-level grant domain model.
//!
//! A grant is a sparse per-user, per-record exception to role-based
//! access. It is independent of the role hierarchy and may carry an
//! expiry, which is evaluated lazily at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::kind::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    View,
    Edit,
}

impl GrantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GrantKind::View => "view",
            GrantKind::Edit => "edit",
        }
    }

    pub fn parse(s: &str) -> Option<GrantKind> {
        match s {
            "view" => Some(GrantKind::View),
            "edit" => Some(GrantKind::Edit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub kind: GrantKind,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl RecordGrant {
    /// Lazy expiry check — an expired grant is indistinguishable from
    /// an absent one.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordGrant {
    pub user_id: Uuid,
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub kind: GrantKind,
    pub granted_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: String,
}
