//! Administrative operations: user management, record-level grants,
//! and the audit read API.

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use eat_core::audit::snapshot;
use eat_core::error::{EatError, EatResult};
use eat_core::models::audit::{AuditAction, AuditEntry, AuditFilter, CreateAuditEntry};
use eat_core::models::grant::{CreateRecordGrant, GrantKind, RecordGrant};
use eat_core::models::kind::ResourceKind;
use eat_core::models::user_profile::{CreateUserProfile, UpdateUserProfile, UserProfile};
use eat_core::rbac::{self, Capability};
use eat_core::repository::{
    AuditRepository, GrantRepository, PaginatedResult, Pagination, UserProfileRepository,
};

use crate::Actor;

/// A grant request from an administrator. The grantor is always the
/// acting user, not caller-supplied.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub user_id: Uuid,
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub kind: GrantKind,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub notes: String,
}

pub struct AdminService<U, G, A>
where
    U: UserProfileRepository,
    G: GrantRepository,
    A: AuditRepository,
{
    users: U,
    grants: G,
    audit: A,
}

impl<U, G, A> AdminService<U, G, A>
where
    U: UserProfileRepository,
    G: GrantRepository,
    A: AuditRepository,
{
    pub fn new(users: U, grants: G, audit: A) -> Self {
        Self {
            users,
            grants,
            audit,
        }
    }

    fn ensure(actor: &Actor, capability: Capability) -> EatResult<()> {
        if rbac::evaluate(actor.role, capability, None).is_denied() {
            warn!(
                actor = %actor.username,
                role = actor.role.map(|r| r.as_str()).unwrap_or("unknown"),
                capability = ?capability,
                "permission denied"
            );
            return Err(EatError::AuthorizationDenied);
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // User management (ApplicationAdmin only)
    // -----------------------------------------------------------------

    pub async fn create_user(
        &self,
        actor: &Actor,
        input: CreateUserProfile,
    ) -> EatResult<UserProfile> {
        Self::ensure(actor, Capability::ManageUsers)?;
        self.users.create(input, &actor.audit_context()).await
    }

    pub async fn get_user(&self, actor: &Actor, id: Uuid) -> EatResult<UserProfile> {
        Self::ensure(actor, Capability::ManageUsers)?;
        self.users.get_by_id(id).await
    }

    pub async fn list_users(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> EatResult<PaginatedResult<UserProfile>> {
        Self::ensure(actor, Capability::ManageUsers)?;
        self.users.list(pagination).await
    }

    /// Update a profile — including role reassignment, which is an
    /// ordinary audited update.
    pub async fn update_user(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateUserProfile,
    ) -> EatResult<UserProfile> {
        Self::ensure(actor, Capability::ManageUsers)?;
        self.users.update(id, input, &actor.audit_context()).await
    }

    pub async fn deactivate_user(&self, actor: &Actor, id: Uuid) -> EatResult<()> {
        Self::ensure(actor, Capability::ManageUsers)?;
        self.users.deactivate(id, &actor.audit_context()).await
    }

    // -----------------------------------------------------------------
    // Record-level grants (SystemsManager and above)
    // -----------------------------------------------------------------

    pub async fn grant(&self, actor: &Actor, request: GrantRequest) -> EatResult<RecordGrant> {
        Self::ensure(actor, Capability::ManageGrants)?;

        let grant = self
            .grants
            .grant(CreateRecordGrant {
                user_id: request.user_id,
                resource_kind: request.resource_kind,
                resource_id: request.resource_id,
                kind: request.kind,
                granted_by: actor.user_id,
                expires_at: request.expires_at,
                notes: request.notes,
            })
            .await?;

        self.audit
            .append(CreateAuditEntry {
                actor_id: Some(actor.user_id),
                actor_name: actor.username.clone(),
                action: AuditAction::Create,
                resource_kind: ResourceKind::RecordGrant,
                resource_id: Some(grant.id.to_string()),
                detail: snapshot(&grant)?,
                ip_address: actor.ip_address.clone(),
                user_agent: actor.user_agent.clone(),
            })
            .await?;

        Ok(grant)
    }

    pub async fn revoke(
        &self,
        actor: &Actor,
        user_id: Uuid,
        resource_kind: ResourceKind,
        resource_id: Uuid,
        kind: GrantKind,
    ) -> EatResult<()> {
        Self::ensure(actor, Capability::ManageGrants)?;

        self.grants
            .revoke(user_id, resource_kind, resource_id, kind)
            .await?;

        self.audit
            .append(CreateAuditEntry {
                actor_id: Some(actor.user_id),
                actor_name: actor.username.clone(),
                action: AuditAction::Delete,
                resource_kind: ResourceKind::RecordGrant,
                resource_id: None,
                detail: json!({
                    "user_id": user_id.to_string(),
                    "resource_kind": resource_kind.as_str(),
                    "resource_id": resource_id.to_string(),
                    "kind": kind.as_str(),
                }),
                ip_address: actor.ip_address.clone(),
                user_agent: actor.user_agent.clone(),
            })
            .await?;

        Ok(())
    }

    pub async fn grants_for_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
    ) -> EatResult<Vec<RecordGrant>> {
        Self::ensure(actor, Capability::ManageGrants)?;
        self.grants.grants_for_user(user_id).await
    }

    pub async fn grants_for_resource(
        &self,
        actor: &Actor,
        resource_kind: ResourceKind,
        resource_id: Uuid,
    ) -> EatResult<Vec<RecordGrant>> {
        Self::ensure(actor, Capability::ManageGrants)?;
        self.grants
            .grants_for_resource(resource_kind, resource_id)
            .await
    }

    // -----------------------------------------------------------------
    // Audit read API (SystemsManager and above)
    // -----------------------------------------------------------------

    pub async fn audit_log(
        &self,
        actor: &Actor,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> EatResult<PaginatedResult<AuditEntry>> {
        Self::ensure(actor, Capability::ViewSystemNotes)?;
        self.audit.list(filter, pagination).await
    }
}
