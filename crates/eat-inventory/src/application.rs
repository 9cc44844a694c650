//! Application operations: generic CRUD plus lifecycle-stage changes
//! and data-store dependency management.

use uuid::Uuid;

use eat_core::error::{EatError, EatResult};
use eat_core::models::application::{
    Application, ApplicationDataStoreDependency, ApplicationLifecycleEvent,
    CreateApplication, CreateApplicationDataStoreDependency, LifecycleStage, UpdateApplication,
};
use eat_core::redact::redact;
use eat_core::repository::{
    ApplicationRepository, GrantRepository, PaginatedResult, Pagination,
};

use crate::{Actor, ResourceService};

/// Application service — wraps the generic [`ResourceService`] and
/// adds the application-specific operations.
pub struct ApplicationService<R, G>
where
    R: ApplicationRepository,
    G: GrantRepository,
{
    service: ResourceService<Application, R, G>,
}

impl<R, G> ApplicationService<R, G>
where
    R: ApplicationRepository,
    G: GrantRepository,
{
    pub fn new(repo: R, grants: G) -> Self {
        Self {
            service: ResourceService::new(repo, grants),
        }
    }

    pub async fn create(&self, actor: &Actor, input: CreateApplication) -> EatResult<Application> {
        self.service.create(actor, input).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> EatResult<Application> {
        self.service.get(actor, id).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateApplication,
    ) -> EatResult<Application> {
        self.service.update(actor, id, input).await
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> EatResult<()> {
        self.service.delete(actor, id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> EatResult<PaginatedResult<Application>> {
        self.service.list(actor, pagination).await
    }

    /// Move an application to a new lifecycle stage. Requires edit
    /// access to the application; records a lifecycle event alongside
    /// the audited stage change.
    pub async fn change_lifecycle_stage(
        &self,
        actor: &Actor,
        id: Uuid,
        to_stage: LifecycleStage,
        notes: String,
    ) -> EatResult<Application> {
        let record = self.service.repo().get(id).await?;
        self.service.ensure_can_edit(actor, &record).await?;
        let updated = self
            .service
            .repo()
            .change_lifecycle_stage(id, to_stage, notes, &actor.audit_context())
            .await?;
        Ok(redact(updated, actor.role))
    }

    /// Lifecycle history, view-gated like the application itself.
    pub async fn lifecycle_events(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> EatResult<Vec<ApplicationLifecycleEvent>> {
        let record = self.service.repo().get(application_id).await?;
        self.service.ensure_can_view(actor, &record).await?;
        self.service
            .repo()
            .list_lifecycle_events(application_id)
            .await
    }

    pub async fn add_datastore_dependency(
        &self,
        actor: &Actor,
        input: CreateApplicationDataStoreDependency,
    ) -> EatResult<ApplicationDataStoreDependency> {
        let record = self.service.repo().get(input.application_id).await?;
        self.service.ensure_can_edit(actor, &record).await?;
        let dependency = self
            .service
            .repo()
            .add_datastore_dependency(input, &actor.audit_context())
            .await?;
        Ok(redact(dependency, actor.role))
    }

    pub async fn remove_datastore_dependency(
        &self,
        actor: &Actor,
        application_id: Uuid,
        dependency_id: Uuid,
    ) -> EatResult<()> {
        let record = self.service.repo().get(application_id).await?;
        self.service.ensure_can_edit(actor, &record).await?;

        // The dependency must belong to the application the actor was
        // authorized against.
        let dependencies = self
            .service
            .repo()
            .list_datastore_dependencies(application_id)
            .await?;
        if !dependencies.iter().any(|d| d.id == dependency_id) {
            return Err(EatError::NotFound {
                entity: "app_datastore_dependency".into(),
                id: dependency_id.to_string(),
            });
        }

        self.service
            .repo()
            .remove_datastore_dependency(dependency_id, &actor.audit_context())
            .await
    }

    pub async fn datastore_dependencies(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> EatResult<Vec<ApplicationDataStoreDependency>> {
        let record = self.service.repo().get(application_id).await?;
        self.service.ensure_can_view(actor, &record).await?;
        let dependencies = self
            .service
            .repo()
            .list_datastore_dependencies(application_id)
            .await?;
        Ok(dependencies
            .into_iter()
            .map(|d| redact(d, actor.role))
            .collect())
    }
}
