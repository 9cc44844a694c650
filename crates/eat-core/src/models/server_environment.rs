//! Server environment domain model — physical, virtual, container, or
//! cloud hosts that applications run on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentType {
    Physical,
    Virtual,
    Container,
    Cloud,
}

impl EnvironmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentType::Physical => "physical",
            EnvironmentType::Virtual => "virtual",
            EnvironmentType::Container => "container",
            EnvironmentType::Cloud => "cloud",
        }
    }

    pub fn parse(s: &str) -> Option<EnvironmentType> {
        match s {
            "physical" => Some(EnvironmentType::Physical),
            "virtual" => Some(EnvironmentType::Virtual),
            "container" => Some(EnvironmentType::Container),
            "cloud" => Some(EnvironmentType::Cloud),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEnvironment {
    pub id: Uuid,
    pub name: String,
    /// Unique across all environments.
    pub hostname: String,
    pub ip_address: String,
    pub environment_type: EnvironmentType,
    pub operating_system: String,
    pub os_version: String,

    // Cloud placement (when environment_type is Cloud).
    pub cloud_platform_id: Option<Uuid>,
    pub cloud_instance_id: Option<String>,
    pub cloud_region: Option<String>,

    // Physical/VM capacity.
    pub cpu_cores: Option<u32>,
    pub memory_gb: Option<u32>,
    pub storage_gb: Option<u32>,

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
pub struct CreateServerEnvironment {
    pub name: String,
    pub hostname: String,
    pub ip_address: String,
    pub environment_type: EnvironmentType,
    pub operating_system: String,
    pub os_version: String,
    pub cloud_platform_id: Option<Uuid>,
    pub cloud_instance_id: Option<String>,
    pub cloud_region: Option<String>,
    pub cpu_cores: Option<u32>,
    pub memory_gb: Option<u32>,
    pub storage_gb: Option<u32>,
    pub public_visible: bool,
    pub notes: String,
    pub system_manager_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServerEnvironment {
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub environment_type: Option<EnvironmentType>,
    pub operating_system: Option<String>,
    pub os_version: Option<String>,
    pub cloud_platform_id: Option<Option<Uuid>>,
    pub cloud_instance_id: Option<Option<String>>,
    pub cloud_region: Option<Option<String>>,
    pub cpu_cores: Option<Option<u32>>,
    pub memory_gb: Option<Option<u32>>,
    pub storage_gb: Option<Option<u32>>,
    pub public_visible: Option<bool>,
    pub notes: Option<String>,
    pub system_manager_notes: Option<Option<String>>,
}
