//! Cloud platform domain model (AWS, Azure, GCP, …).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudPlatform {
    pub id: Uuid,
    pub name: String,
    /// Short identifier, e.g. `aws`, `azure`, `gcp`. Unique.
    pub code: String,
    pub description: String,
    /// Readable by business roles when set; otherwise restricted to
    /// creators, grantees, and level-4+ roles.
    pub public_visible: bool,
    pub is_active: bool,
    pub notes: String,
    /// Restricted attribute — cleared by the redactor for viewers
    /// without the ViewSystemNotes capability.
    pub system_manager_notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCloudPlatform {
    pub name: String,
    pub code: String,
    pub description: String,
    pub public_visible: bool,
    pub notes: String,
    pub system_manager_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCloudPlatform {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub public_visible: Option<bool>,
    pub notes: Option<String>,
    /// `Some(Some(v))` = set, `Some(None)` = clear, `None` = no change.
    pub system_manager_notes: Option<Option<String>>,
}
