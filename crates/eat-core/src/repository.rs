//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Mutating operations take an
//! [`AuditContext`] and must persist the corresponding audit entry in
//! the same transaction as the mutation — if the audit write fails,
//! the mutation must not be observable afterward.

use uuid::Uuid;

use crate::error::EatResult;
use crate::models::{
    application::{
        Application, ApplicationDataStoreDependency, ApplicationLifecycleEvent,
        CreateApplicationDataStoreDependency, LifecycleStage,
    },
    audit::{AuditEntry, AuditFilter, CreateAuditEntry, SYSTEM_ACTOR},
    grant::{CreateRecordGrant, GrantKind, RecordGrant},
    kind::ResourceKind,
    role::Role,
    session::{CreateSession, Session},
    user_profile::{CreateUserProfile, UpdateUserProfile, UserProfile},
};
use crate::resource::TrackedResource;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Who performed a mutation, for the audit entry written alongside it.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    /// Context for actions not attributable to a user account
    /// (bootstrap, maintenance jobs).
    pub fn system() -> Self {
        Self {
            actor_id: None,
            actor_name: SYSTEM_ACTOR.into(),
            ip_address: None,
            user_agent: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracked resources
// ---------------------------------------------------------------------------

/// CRUD over one tracked-resource type. Every mutation commits its
/// audit entry atomically with the change.
pub trait ResourceRepository<T: TrackedResource>: Send + Sync {
    fn create(
        &self,
        input: T::Create,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<T>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = EatResult<T>> + Send;
    /// Applies only the populated fields. An update that changes
    /// nothing performs no write and records no audit entry.
    fn update(
        &self,
        id: Uuid,
        input: T::Update,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<T>> + Send;
    /// Soft delete: sets `is_active = false` and records a DELETE
    /// entry holding the pre-deletion snapshot.
    fn soft_delete(&self, id: Uuid, ctx: &AuditContext)
    -> impl Future<Output = EatResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = EatResult<PaginatedResult<T>>> + Send;
}

/// Application-specific operations on top of the generic CRUD.
pub trait ApplicationRepository: ResourceRepository<Application> {
    /// Change the lifecycle stage, recording the lifecycle event and
    /// the audit entry in the same transaction as the stage change.
    fn change_lifecycle_stage(
        &self,
        id: Uuid,
        to_stage: LifecycleStage,
        notes: String,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<Application>> + Send;
    fn list_lifecycle_events(
        &self,
        application_id: Uuid,
    ) -> impl Future<Output = EatResult<Vec<ApplicationLifecycleEvent>>> + Send;
    fn add_datastore_dependency(
        &self,
        input: CreateApplicationDataStoreDependency,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<ApplicationDataStoreDependency>> + Send;
    fn remove_datastore_dependency(
        &self,
        id: Uuid,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<()>> + Send;
    fn list_datastore_dependencies(
        &self,
        application_id: Uuid,
    ) -> impl Future<Output = EatResult<Vec<ApplicationDataStoreDependency>>> + Send;
}

// ---------------------------------------------------------------------------
// User profiles
// ---------------------------------------------------------------------------

pub trait UserProfileRepository: Send + Sync {
    fn create(
        &self,
        input: CreateUserProfile,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<UserProfile>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = EatResult<UserProfile>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = EatResult<UserProfile>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUserProfile,
        ctx: &AuditContext,
    ) -> impl Future<Output = EatResult<UserProfile>> + Send;
    /// Soft-deactivate. Profiles are never hard-deleted.
    fn deactivate(&self, id: Uuid, ctx: &AuditContext)
    -> impl Future<Output = EatResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = EatResult<PaginatedResult<UserProfile>>> + Send;
    fn count_by_role(&self, role: Role) -> impl Future<Output = EatResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Record-level grants
// ---------------------------------------------------------------------------

pub trait GrantRepository: Send + Sync {
    /// Upsert: granting the same (user, target, kind) twice yields one
    /// effective grant with the latest expiry.
    fn grant(&self, input: CreateRecordGrant)
    -> impl Future<Output = EatResult<RecordGrant>> + Send;
    fn revoke(
        &self,
        user_id: Uuid,
        resource_kind: ResourceKind,
        resource_id: Uuid,
        kind: GrantKind,
    ) -> impl Future<Output = EatResult<()>> + Send;
    /// Lazy expiry: a grant past its `expires_at` reads as absent with
    /// no cleanup pass.
    fn has_grant(
        &self,
        user_id: Uuid,
        resource_kind: ResourceKind,
        resource_id: Uuid,
        kind: GrantKind,
    ) -> impl Future<Output = EatResult<bool>> + Send;
    fn grants_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = EatResult<Vec<RecordGrant>>> + Send;
    fn grants_for_resource(
        &self,
        resource_kind: ResourceKind,
        resource_id: Uuid,
    ) -> impl Future<Output = EatResult<Vec<RecordGrant>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

pub trait AuditRepository: Send + Sync {
    /// Append one entry. There is no update or delete counterpart.
    fn append(
        &self,
        entry: CreateAuditEntry,
    ) -> impl Future<Output = EatResult<AuditEntry>> + Send;
    /// Filtered read, ordered by timestamp ascending (commit order for
    /// any single resource).
    fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> impl Future<Output = EatResult<PaginatedResult<AuditEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = EatResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = EatResult<Session>> + Send;
    fn invalidate(&self, id: Uuid) -> impl Future<Output = EatResult<()>> + Send;
    fn invalidate_user_sessions(&self, user_id: Uuid)
    -> impl Future<Output = EatResult<()>> + Send;
}
