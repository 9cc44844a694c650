//! Application domain model — the enterprise applications tracked by
//! the system, their lifecycle history, and their data-store
//! dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Planning,
    Development,
    Testing,
    Staging,
    Production,
    Maintenance,
    Deprecated,
    Retired,
}

impl LifecycleStage {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStage::Planning => "planning",
            LifecycleStage::Development => "development",
            LifecycleStage::Testing => "testing",
            LifecycleStage::Staging => "staging",
            LifecycleStage::Production => "production",
            LifecycleStage::Maintenance => "maintenance",
            LifecycleStage::Deprecated => "deprecated",
            LifecycleStage::Retired => "retired",
        }
    }

    pub fn parse(s: &str) -> Option<LifecycleStage> {
        match s {
            "planning" => Some(LifecycleStage::Planning),
            "development" => Some(LifecycleStage::Development),
            "testing" => Some(LifecycleStage::Testing),
            "staging" => Some(LifecycleStage::Staging),
            "production" => Some(LifecycleStage::Production),
            "maintenance" => Some(LifecycleStage::Maintenance),
            "deprecated" => Some(LifecycleStage::Deprecated),
            "retired" => Some(LifecycleStage::Retired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub fn as_str(self) -> &'static str {
        match self {
            Criticality::Low => "low",
            Criticality::Medium => "medium",
            Criticality::High => "high",
            Criticality::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Criticality> {
        match s {
            "low" => Some(Criticality::Low),
            "medium" => Some(Criticality::Medium),
            "high" => Some(Criticality::High),
            "critical" => Some(Criticality::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// What business function the application serves.
    pub business_purpose: String,
    pub lifecycle_stage: LifecycleStage,
    pub criticality: Criticality,
    pub business_owner: String,
    pub technical_owner: String,
    pub primary_server_id: Uuid,
    pub version: String,
    pub deployment_path: String,
    pub public_visible: bool,
    pub is_active: bool,
    pub notes: String,
    pub system_manager_notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub name: String,
    pub description: String,
    pub business_purpose: String,
    pub lifecycle_stage: LifecycleStage,
    pub criticality: Criticality,
    pub business_owner: String,
    pub technical_owner: String,
    pub primary_server_id: Uuid,
    pub version: String,
    pub deployment_path: String,
    pub public_visible: bool,
    pub notes: String,
    pub system_manager_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateApplication {
    pub name: Option<String>,
    pub description: Option<String>,
    pub business_purpose: Option<String>,
    pub lifecycle_stage: Option<LifecycleStage>,
    pub criticality: Option<Criticality>,
    pub business_owner: Option<String>,
    pub technical_owner: Option<String>,
    pub primary_server_id: Option<Uuid>,
    pub version: Option<String>,
    pub deployment_path: Option<String>,
    pub public_visible: Option<bool>,
    pub notes: Option<String>,
    pub system_manager_notes: Option<Option<String>>,
}

/// Append-only record of a lifecycle stage change. Written in the same
/// transaction as the stage change itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationLifecycleEvent {
    pub id: Uuid,
    pub application_id: Uuid,
    pub from_stage: Option<LifecycleStage>,
    pub to_stage: LifecycleStage,
    pub performed_by: Uuid,
    pub notes: String,
    pub event_date: DateTime<Utc>,
}

/// A data store an application depends on. Unique per
/// (application, datastore instance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDataStoreDependency {
    pub id: Uuid,
    pub application_id: Uuid,
    pub datastore_instance_id: Uuid,
    pub is_primary: bool,
    /// read-write, read-only, cache, etc.
    pub connection_type: String,
    pub notes: String,
    pub system_manager_notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationDataStoreDependency {
    pub application_id: Uuid,
    pub datastore_instance_id: Uuid,
    pub is_primary: bool,
    pub connection_type: String,
    pub notes: String,
    pub system_manager_notes: Option<String>,
}
