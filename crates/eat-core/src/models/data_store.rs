//! Data store domain model — database systems and storage solutions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStoreType {
    Relational,
    Nosql,
    Cache,
    Search,
    File,
    Object,
    Queue,
}

impl DataStoreType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataStoreType::Relational => "relational",
            DataStoreType::Nosql => "nosql",
            DataStoreType::Cache => "cache",
            DataStoreType::Search => "search",
            DataStoreType::File => "file",
            DataStoreType::Object => "object",
            DataStoreType::Queue => "queue",
        }
    }

    pub fn parse(s: &str) -> Option<DataStoreType> {
        match s {
            "relational" => Some(DataStoreType::Relational),
            "nosql" => Some(DataStoreType::Nosql),
            "cache" => Some(DataStoreType::Cache),
            "search" => Some(DataStoreType::Search),
            "file" => Some(DataStoreType::File),
            "object" => Some(DataStoreType::Object),
            "queue" => Some(DataStoreType::Queue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStore {
    pub id: Uuid,
    pub name: String,
    pub datastore_type: DataStoreType,
    pub description: String,
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
pub struct CreateDataStore {
    pub name: String,
    pub datastore_type: DataStoreType,
    pub description: String,
    pub public_visible: bool,
    pub notes: String,
    pub system_manager_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDataStore {
    pub name: Option<String>,
    pub datastore_type: Option<DataStoreType>,
    pub description: Option<String>,
    pub public_visible: Option<bool>,
    pub notes: Option<String>,
    pub system_manager_notes: Option<Option<String>>,
}
