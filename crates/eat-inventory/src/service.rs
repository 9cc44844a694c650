//! Generic permission-gated CRUD over any tracked resource.

use std::marker::PhantomData;

use tracing::warn;
use uuid::Uuid;

use eat_core::error::{EatError, EatResult};
use eat_core::models::grant::GrantKind;
use eat_core::models::role::Role;
use eat_core::rbac::{self, Capability, TargetAccess};
use eat_core::redact::redact;
use eat_core::repository::{GrantRepository, PaginatedResult, Pagination, ResourceRepository};
use eat_core::resource::TrackedResource;

/// CRUD over one tracked-resource type, gated by the permission
/// evaluator and finished by the redactor.
pub struct ResourceService<T, R, G>
where
    T: TrackedResource,
    R: ResourceRepository<T>,
    G: GrantRepository,
{
    repo: R,
    grants: G,
    _resource: PhantomData<fn() -> T>,
}

impl<T, R, G> ResourceService<T, R, G>
where
    T: TrackedResource,
    R: ResourceRepository<T>,
    G: GrantRepository,
{
    pub fn new(repo: R, grants: G) -> Self {
        Self {
            repo,
            grants,
            _resource: PhantomData,
        }
    }

    /// Access to the underlying repository, for resource-specific
    /// operations layered on top of the generic CRUD.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Assemble the actor's relationship to a record. Grant lookups
    /// are skipped for roles that pass on level alone.
    pub(crate) async fn target_access(
        &self,
        actor: &crate::Actor,
        record: &T,
    ) -> EatResult<TargetAccess> {
        let needs_grants = actor
            .role
            .is_some_and(|r| r.level() < Role::SystemsManager.level());

        let (view_granted, edit_granted) = if needs_grants {
            (
                self.grants
                    .has_grant(actor.user_id, T::KIND, record.id(), GrantKind::View)
                    .await?,
                self.grants
                    .has_grant(actor.user_id, T::KIND, record.id(), GrantKind::Edit)
                    .await?,
            )
        } else {
            (false, false)
        };

        Ok(TargetAccess {
            is_creator: record.created_by() == Some(actor.user_id),
            public_visible: record.public_visible(),
            view_granted,
            edit_granted,
        })
    }

    pub(crate) fn deny(actor: &crate::Actor, capability: Capability) -> EatError {
        warn!(
            actor = %actor.username,
            role = actor.role.map(|r| r.as_str()).unwrap_or("unknown"),
            capability = ?capability,
            kind = %T::KIND,
            "permission denied"
        );
        EatError::AuthorizationDenied
    }

    pub(crate) async fn ensure_can_view(&self, actor: &crate::Actor, record: &T) -> EatResult<()> {
        let access = self.target_access(actor, record).await?;
        if rbac::evaluate(actor.role, Capability::ViewRecords, Some(&access)).is_denied() {
            return Err(Self::deny(actor, Capability::ViewRecords));
        }
        Ok(())
    }

    pub(crate) async fn ensure_can_edit(&self, actor: &crate::Actor, record: &T) -> EatResult<()> {
        let access = self.target_access(actor, record).await?;
        if rbac::evaluate(actor.role, Capability::EditRecords, Some(&access)).is_denied() {
            return Err(Self::deny(actor, Capability::EditRecords));
        }
        Ok(())
    }

    pub async fn create(&self, actor: &crate::Actor, input: T::Create) -> EatResult<T> {
        if rbac::evaluate(actor.role, Capability::CreateRecords, None).is_denied() {
            return Err(Self::deny(actor, Capability::CreateRecords));
        }
        let created = self.repo.create(input, &actor.audit_context()).await?;
        Ok(redact(created, actor.role))
    }

    pub async fn get(&self, actor: &crate::Actor, id: Uuid) -> EatResult<T> {
        let record = self.repo.get(id).await?;
        self.ensure_can_view(actor, &record).await?;
        Ok(redact(record, actor.role))
    }

    pub async fn update(&self, actor: &crate::Actor, id: Uuid, input: T::Update) -> EatResult<T> {
        let record = self.repo.get(id).await?;
        self.ensure_can_edit(actor, &record).await?;
        let updated = self.repo.update(id, input, &actor.audit_context()).await?;
        Ok(redact(updated, actor.role))
    }

    pub async fn delete(&self, actor: &crate::Actor, id: Uuid) -> EatResult<()> {
        if rbac::evaluate(actor.role, Capability::DeleteRecords, None).is_denied() {
            return Err(Self::deny(actor, Capability::DeleteRecords));
        }
        self.repo.soft_delete(id, &actor.audit_context()).await
    }

    /// List a page of records the actor may see, redacted.
    ///
    /// Visibility filtering happens after pagination, so `total`
    /// counts records before filtering.
    pub async fn list(
        &self,
        actor: &crate::Actor,
        pagination: Pagination,
    ) -> EatResult<PaginatedResult<T>> {
        if rbac::evaluate(actor.role, Capability::ViewRecords, None).is_denied() {
            return Err(Self::deny(actor, Capability::ViewRecords));
        }

        let page = self.repo.list(pagination).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            let access = self.target_access(actor, &record).await?;
            if rbac::evaluate(actor.role, Capability::ViewRecords, Some(&access)).is_allowed() {
                items.push(redact(record, actor.role));
            }
        }

        Ok(PaginatedResult {
            items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }
}
