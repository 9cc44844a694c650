//! The generic tracked-resource contract.
//!
//! Every inventory entity (application, server, data store, …) is a
//! [`TrackedResource`]: it has a stable id, an optional creator, a
//! business-visibility marker, a soft-delete flag, and restricted
//! attributes handled by the redactor. The service and repository
//! layers are written once against this trait.

use serde::Serialize;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationDataStoreDependency};
use crate::models::cloud_platform::CloudPlatform;
use crate::models::data_store::DataStore;
use crate::models::data_store_instance::DataStoreInstance;
use crate::models::kind::ResourceKind;
use crate::models::server_environment::ServerEnvironment;
use crate::redact::Redactable;

pub trait TrackedResource: Redactable + Serialize + Clone + Send + Sync + Sized {
    const KIND: ResourceKind;

    /// Input type for creation.
    type Create: Send + Sync;
    /// Partial-update input type. `None` fields are left untouched.
    type Update: Send + Sync;

    fn id(&self) -> Uuid;
    fn created_by(&self) -> Option<Uuid>;
    fn public_visible(&self) -> bool;
    fn is_active(&self) -> bool;
}

macro_rules! impl_tracked_resource {
    ($ty:ty, $kind:expr, $create:ty, $update:ty) => {
        impl Redactable for $ty {
            fn clear_restricted(&mut self) {
                self.system_manager_notes = None;
            }
        }

        impl TrackedResource for $ty {
            const KIND: ResourceKind = $kind;
            type Create = $create;
            type Update = $update;

            fn id(&self) -> Uuid {
                self.id
            }

            fn created_by(&self) -> Option<Uuid> {
                self.created_by
            }

            fn public_visible(&self) -> bool {
                self.public_visible
            }

            fn is_active(&self) -> bool {
                self.is_active
            }
        }
    };
}

impl_tracked_resource!(
    CloudPlatform,
    ResourceKind::CloudPlatform,
    crate::models::cloud_platform::CreateCloudPlatform,
    crate::models::cloud_platform::UpdateCloudPlatform
);
impl_tracked_resource!(
    ServerEnvironment,
    ResourceKind::ServerEnvironment,
    crate::models::server_environment::CreateServerEnvironment,
    crate::models::server_environment::UpdateServerEnvironment
);
impl_tracked_resource!(
    DataStore,
    ResourceKind::DataStore,
    crate::models::data_store::CreateDataStore,
    crate::models::data_store::UpdateDataStore
);
impl_tracked_resource!(
    DataStoreInstance,
    ResourceKind::DataStoreInstance,
    crate::models::data_store_instance::CreateDataStoreInstance,
    crate::models::data_store_instance::UpdateDataStoreInstance
);
impl_tracked_resource!(
    Application,
    ResourceKind::Application,
    crate::models::application::CreateApplication,
    crate::models::application::UpdateApplication
);

// Dependency links are not standalone tracked resources (they are
// managed through their owning application) but still carry a
// restricted attribute.
impl Redactable for ApplicationDataStoreDependency {
    fn clear_restricted(&mut self) {
        self.system_manager_notes = None;
    }
}
