//! Resource kind — identifies the entity type a grant or audit entry
//! refers to.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    CloudPlatform,
    ServerEnvironment,
    DataStore,
    DataStoreInstance,
    Application,
    ApplicationDataStoreDependency,
    ApplicationLifecycleEvent,
    UserProfile,
    RecordGrant,
    AuditLog,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::CloudPlatform => "cloud_platform",
            ResourceKind::ServerEnvironment => "server_environment",
            ResourceKind::DataStore => "data_store",
            ResourceKind::DataStoreInstance => "data_store_instance",
            ResourceKind::Application => "application",
            ResourceKind::ApplicationDataStoreDependency => "app_datastore_dependency",
            ResourceKind::ApplicationLifecycleEvent => "lifecycle_event",
            ResourceKind::UserProfile => "user_profile",
            ResourceKind::RecordGrant => "record_grant",
            ResourceKind::AuditLog => "audit_log",
        }
    }

    pub fn parse(s: &str) -> Option<ResourceKind> {
        match s {
            "cloud_platform" => Some(ResourceKind::CloudPlatform),
            "server_environment" => Some(ResourceKind::ServerEnvironment),
            "data_store" => Some(ResourceKind::DataStore),
            "data_store_instance" => Some(ResourceKind::DataStoreInstance),
            "application" => Some(ResourceKind::Application),
            "app_datastore_dependency" => Some(ResourceKind::ApplicationDataStoreDependency),
            "lifecycle_event" => Some(ResourceKind::ApplicationLifecycleEvent),
            "user_profile" => Some(ResourceKind::UserProfile),
            "record_grant" => Some(ResourceKind::RecordGrant),
            "audit_log" => Some(ResourceKind::AuditLog),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
