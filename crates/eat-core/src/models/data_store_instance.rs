//! Data store instance domain model — a concrete database instance
//! running on a server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStoreInstance {
    pub id: Uuid,
    pub server_id: Uuid,
    pub datastore_id: Uuid,
    pub version: String,
    pub instance_name: String,
    pub port: Option<u16>,
    pub connection_string: Option<String>,
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
pub struct CreateDataStoreInstance {
    pub server_id: Uuid,
    pub datastore_id: Uuid,
    pub version: String,
    pub instance_name: String,
    pub port: Option<u16>,
    pub connection_string: Option<String>,
    pub public_visible: bool,
    pub notes: String,
    pub system_manager_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDataStoreInstance {
    pub version: Option<String>,
    pub instance_name: Option<String>,
    pub port: Option<Option<u16>>,
    pub connection_string: Option<Option<String>>,
    pub public_visible: Option<bool>,
    pub notes: Option<String>,
    pub system_manager_notes: Option<Option<String>>,
}
