//! SurrealDB implementation of the application repository, including
//! lifecycle-stage tracking and data-store dependency links.
//!
//! A lifecycle stage change writes the stage update, the lifecycle
//! event, and the audit entry in one transaction.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::audit::{diff_fields, snapshot};
use eat_core::error::EatResult;
use eat_core::models::application::{
    Application, ApplicationDataStoreDependency, ApplicationLifecycleEvent,
    CreateApplication, CreateApplicationDataStoreDependency, Criticality, LifecycleStage,
    UpdateApplication,
};
use eat_core::models::audit::AuditAction;
use eat_core::models::kind::ResourceKind;
use eat_core::repository::{
    ApplicationRepository, AuditContext, PaginatedResult, Pagination, ResourceRepository,
};

use crate::error::DbError;
use crate::repository::{AuditBinds, CountRow, parse_opt_uuid, parse_uuid, with_audit};

fn parse_stage(s: &str) -> Result<LifecycleStage, DbError> {
    LifecycleStage::parse(s)
        .ok_or_else(|| DbError::Corrupt(format!("unknown lifecycle stage: {s}")))
}

fn parse_criticality(s: &str) -> Result<Criticality, DbError> {
    Criticality::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown criticality: {s}")))
}

#[derive(Debug, SurrealValue)]
struct ApplicationRow {
    name: String,
    description: String,
    business_purpose: String,
    lifecycle_stage: String,
    criticality: String,
    business_owner: String,
    technical_owner: String,
    primary_server_id: String,
    version: String,
    deployment_path: String,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn from_model(m: &Application) -> Self {
        Self {
            name: m.name.clone(),
            description: m.description.clone(),
            business_purpose: m.business_purpose.clone(),
            lifecycle_stage: m.lifecycle_stage.as_str().to_string(),
            criticality: m.criticality.as_str().to_string(),
            business_owner: m.business_owner.clone(),
            technical_owner: m.technical_owner.clone(),
            primary_server_id: m.primary_server_id.to_string(),
            version: m.version.clone(),
            deployment_path: m.deployment_path.clone(),
            public_visible: m.public_visible,
            is_active: m.is_active,
            notes: m.notes.clone(),
            system_manager_notes: m.system_manager_notes.clone(),
            created_by: m.created_by.map(|u| u.to_string()),
            updated_by: m.updated_by.map(|u| u.to_string()),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    fn into_model(self, id: Uuid) -> Result<Application, DbError> {
        Ok(Application {
            id,
            name: self.name,
            description: self.description,
            business_purpose: self.business_purpose,
            lifecycle_stage: parse_stage(&self.lifecycle_stage)?,
            criticality: parse_criticality(&self.criticality)?,
            business_owner: self.business_owner,
            technical_owner: self.technical_owner,
            primary_server_id: parse_uuid("primary_server", &self.primary_server_id)?,
            version: self.version,
            deployment_path: self.deployment_path,
            public_visible: self.public_visible,
            is_active: self.is_active,
            notes: self.notes,
            system_manager_notes: self.system_manager_notes,
            created_by: parse_opt_uuid("created_by", self.created_by)?,
            updated_by: parse_opt_uuid("updated_by", self.updated_by)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ApplicationRowWithId {
    record_id: String,
    name: String,
    description: String,
    business_purpose: String,
    lifecycle_stage: String,
    criticality: String,
    business_owner: String,
    technical_owner: String,
    primary_server_id: String,
    version: String,
    deployment_path: String,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRowWithId {
    fn try_into_model(self) -> Result<Application, DbError> {
        let id = parse_uuid("application", &self.record_id)?;
        ApplicationRow {
            name: self.name,
            description: self.description,
            business_purpose: self.business_purpose,
            lifecycle_stage: self.lifecycle_stage,
            criticality: self.criticality,
            business_owner: self.business_owner,
            technical_owner: self.technical_owner,
            primary_server_id: self.primary_server_id,
            version: self.version,
            deployment_path: self.deployment_path,
            public_visible: self.public_visible,
            is_active: self.is_active,
            notes: self.notes,
            system_manager_notes: self.system_manager_notes,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_model(id)
    }
}

#[derive(Debug, SurrealValue)]
struct LifecycleEventRowWithId {
    record_id: String,
    application_id: String,
    from_stage: Option<String>,
    to_stage: String,
    performed_by: String,
    notes: String,
    event_date: DateTime<Utc>,
}

impl LifecycleEventRowWithId {
    fn try_into_model(self) -> Result<ApplicationLifecycleEvent, DbError> {
        Ok(ApplicationLifecycleEvent {
            id: parse_uuid("lifecycle_event", &self.record_id)?,
            application_id: parse_uuid("application", &self.application_id)?,
            from_stage: self.from_stage.as_deref().map(parse_stage).transpose()?,
            to_stage: parse_stage(&self.to_stage)?,
            performed_by: parse_uuid("performed_by", &self.performed_by)?,
            notes: self.notes,
            event_date: self.event_date,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct DependencyRowWithId {
    record_id: String,
    application_id: String,
    datastore_instance_id: String,
    is_primary: bool,
    connection_type: String,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl DependencyRowWithId {
    fn try_into_model(self) -> Result<ApplicationDataStoreDependency, DbError> {
        Ok(ApplicationDataStoreDependency {
            id: parse_uuid("app_datastore_dependency", &self.record_id)?,
            application_id: parse_uuid("application", &self.application_id)?,
            datastore_instance_id: parse_uuid(
                "datastore_instance",
                &self.datastore_instance_id,
            )?,
            is_primary: self.is_primary,
            connection_type: self.connection_type,
            notes: self.notes,
            system_manager_notes: self.system_manager_notes,
            created_by: parse_opt_uuid("created_by", self.created_by)?,
            created_at: self.created_at,
        })
    }
}

fn apply_update(model: &mut Application, input: UpdateApplication) {
    if let Some(name) = input.name {
        model.name = name;
    }
    if let Some(description) = input.description {
        model.description = description;
    }
    if let Some(business_purpose) = input.business_purpose {
        model.business_purpose = business_purpose;
    }
    if let Some(lifecycle_stage) = input.lifecycle_stage {
        model.lifecycle_stage = lifecycle_stage;
    }
    if let Some(criticality) = input.criticality {
        model.criticality = criticality;
    }
    if let Some(business_owner) = input.business_owner {
        model.business_owner = business_owner;
    }
    if let Some(technical_owner) = input.technical_owner {
        model.technical_owner = technical_owner;
    }
    if let Some(primary_server_id) = input.primary_server_id {
        model.primary_server_id = primary_server_id;
    }
    if let Some(version) = input.version {
        model.version = version;
    }
    if let Some(deployment_path) = input.deployment_path {
        model.deployment_path = deployment_path;
    }
    if let Some(public_visible) = input.public_visible {
        model.public_visible = public_visible;
    }
    if let Some(notes) = input.notes {
        model.notes = notes;
    }
    if let Some(system_manager_notes) = input.system_manager_notes {
        model.system_manager_notes = system_manager_notes;
    }
}

const LIFECYCLE_EVENT_CREATE_SQL: &str = "\
    CREATE type::record('lifecycle_event', $event_id) SET \
    application_id = $event_application_id, \
    from_stage = $event_from_stage, \
    to_stage = $event_to_stage, \
    performed_by = $event_performed_by, \
    notes = $event_notes, \
    event_date = $event_date;";

/// SurrealDB implementation of the Application repository.
#[derive(Clone)]
pub struct SurrealApplicationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealApplicationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository<Application> for SurrealApplicationRepository<C> {
    async fn create(&self, input: CreateApplication, ctx: &AuditContext) -> EatResult<Application> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = Application {
            id,
            name: input.name,
            description: input.description,
            business_purpose: input.business_purpose,
            lifecycle_stage: input.lifecycle_stage,
            criticality: input.criticality,
            business_owner: input.business_owner,
            technical_owner: input.technical_owner,
            primary_server_id: input.primary_server_id,
            version: input.version,
            deployment_path: input.deployment_path,
            public_visible: input.public_visible,
            is_active: true,
            notes: input.notes,
            system_manager_notes: input.system_manager_notes,
            created_by: ctx.actor_id,
            updated_by: ctx.actor_id,
            created_at: now,
            updated_at: now,
        };

        let detail = snapshot(&model)?;
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Create,
            ResourceKind::Application,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "CREATE type::record('application', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", ApplicationRow::from_model(&model)));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn get(&self, id: Uuid) -> EatResult<Application> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('application', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.into_model(id)?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateApplication,
        ctx: &AuditContext,
    ) -> EatResult<Application> {
        let old = self.get(id).await?;
        let mut model = old.clone();
        apply_update(&mut model, input);

        let changes = diff_fields(&snapshot(&old)?, &snapshot(&model)?);
        if changes.is_empty() {
            return Ok(old);
        }

        let now = Utc::now();
        model.updated_at = now;
        model.updated_by = ctx.actor_id;

        let audit = AuditBinds::new(
            ctx,
            AuditAction::Update,
            ResourceKind::Application,
            Some(id.to_string()),
            serde_json::Value::Object(changes),
            now,
        );

        // An ordinary update that moves the lifecycle stage still
        // records the lifecycle event, in the same transaction.
        let stage_changed = old.lifecycle_stage != model.lifecycle_stage;
        let mutation_sql = if stage_changed {
            format!(
                "UPDATE type::record('application', $id) CONTENT $row; \
                 {LIFECYCLE_EVENT_CREATE_SQL}"
            )
        } else {
            "UPDATE type::record('application', $id) CONTENT $row;".to_string()
        };

        let mut query = self
            .db
            .query(with_audit(&mutation_sql))
            .bind(("id", id.to_string()))
            .bind(("row", ApplicationRow::from_model(&model)));
        if stage_changed {
            query = query
                .bind(("event_id", Uuid::new_v4().to_string()))
                .bind(("event_application_id", id.to_string()))
                .bind((
                    "event_from_stage",
                    Some(old.lifecycle_stage.as_str().to_string()),
                ))
                .bind(("event_to_stage", model.lifecycle_stage.as_str().to_string()))
                .bind((
                    "event_performed_by",
                    ctx.actor_id.unwrap_or(Uuid::nil()).to_string(),
                ))
                .bind(("event_notes", String::new()))
                .bind(("event_date", now));
        }
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn soft_delete(&self, id: Uuid, ctx: &AuditContext) -> EatResult<()> {
        let old = self.get(id).await?;
        if !old.is_active {
            return Ok(());
        }

        let now = Utc::now();
        let detail = snapshot(&old)?;
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Delete,
            ResourceKind::Application,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('application', $id) SET \
                 is_active = false, updated_at = $now, updated_by = $updated_by;",
            ))
            .bind(("id", id.to_string()))
            .bind(("now", now))
            .bind(("updated_by", ctx.actor_id.map(|u| u.to_string())));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> EatResult<PaginatedResult<Application>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM application GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM application \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_model())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

impl<C: Connection> ApplicationRepository for SurrealApplicationRepository<C> {
    async fn change_lifecycle_stage(
        &self,
        id: Uuid,
        to_stage: LifecycleStage,
        notes: String,
        ctx: &AuditContext,
    ) -> EatResult<Application> {
        let old = self.get(id).await?;
        if old.lifecycle_stage == to_stage {
            return Ok(old);
        }

        let now = Utc::now();
        let mut model = old.clone();
        model.lifecycle_stage = to_stage;
        model.updated_at = now;
        model.updated_by = ctx.actor_id;

        let changes = diff_fields(&snapshot(&old)?, &snapshot(&model)?);
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Update,
            ResourceKind::Application,
            Some(id.to_string()),
            serde_json::Value::Object(changes),
            now,
        );

        let mutation_sql = format!(
            "UPDATE type::record('application', $id) CONTENT $row; \
             {LIFECYCLE_EVENT_CREATE_SQL}"
        );
        let query = self
            .db
            .query(with_audit(&mutation_sql))
            .bind(("id", id.to_string()))
            .bind(("row", ApplicationRow::from_model(&model)))
            .bind(("event_id", Uuid::new_v4().to_string()))
            .bind(("event_application_id", id.to_string()))
            .bind((
                "event_from_stage",
                Some(old.lifecycle_stage.as_str().to_string()),
            ))
            .bind(("event_to_stage", to_stage.as_str().to_string()))
            .bind((
                "event_performed_by",
                ctx.actor_id.unwrap_or(Uuid::nil()).to_string(),
            ))
            .bind(("event_notes", notes))
            .bind(("event_date", now));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn list_lifecycle_events(
        &self,
        application_id: Uuid,
    ) -> EatResult<Vec<ApplicationLifecycleEvent>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lifecycle_event \
                 WHERE application_id = $application_id \
                 ORDER BY event_date ASC",
            )
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LifecycleEventRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_model())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn add_datastore_dependency(
        &self,
        input: CreateApplicationDataStoreDependency,
        ctx: &AuditContext,
    ) -> EatResult<ApplicationDataStoreDependency> {
        // The owning application must exist (and soft-deleted apps
        // take no new dependencies).
        let application = self.get(input.application_id).await?;
        if !application.is_active {
            return Err(DbError::NotFound {
                entity: "application".into(),
                id: input.application_id.to_string(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = ApplicationDataStoreDependency {
            id,
            application_id: input.application_id,
            datastore_instance_id: input.datastore_instance_id,
            is_primary: input.is_primary,
            connection_type: input.connection_type,
            notes: input.notes,
            system_manager_notes: input.system_manager_notes,
            created_by: ctx.actor_id,
            created_at: now,
        };

        let detail = snapshot(&model)?;
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Create,
            ResourceKind::ApplicationDataStoreDependency,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "CREATE type::record('app_datastore_dependency', $id) SET \
                 application_id = $application_id, \
                 datastore_instance_id = $datastore_instance_id, \
                 is_primary = $is_primary, \
                 connection_type = $connection_type, \
                 notes = $notes, \
                 system_manager_notes = $system_manager_notes, \
                 created_by = $created_by, \
                 created_at = $created_at;",
            ))
            .bind(("id", id.to_string()))
            .bind(("application_id", model.application_id.to_string()))
            .bind((
                "datastore_instance_id",
                model.datastore_instance_id.to_string(),
            ))
            .bind(("is_primary", model.is_primary))
            .bind(("connection_type", model.connection_type.clone()))
            .bind(("notes", model.notes.clone()))
            .bind(("system_manager_notes", model.system_manager_notes.clone()))
            .bind(("created_by", model.created_by.map(|u| u.to_string())))
            .bind(("created_at", now));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn remove_datastore_dependency(&self, id: Uuid, ctx: &AuditContext) -> EatResult<()> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('app_datastore_dependency', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<DependencyRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "app_datastore_dependency".into(),
            id: id_str,
        })?;
        let model = row.try_into_model()?;

        let now = Utc::now();
        let detail = snapshot(&model)?;
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Delete,
            ResourceKind::ApplicationDataStoreDependency,
            Some(id.to_string()),
            detail,
            now,
        );

        // Dependency links are hard-deleted: the DELETE snapshot in
        // the audit entry preserves the forensic record.
        let query = self
            .db
            .query(with_audit(
                "DELETE type::record('app_datastore_dependency', $id);",
            ))
            .bind(("id", id.to_string()));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_datastore_dependencies(
        &self,
        application_id: Uuid,
    ) -> EatResult<Vec<ApplicationDataStoreDependency>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM app_datastore_dependency \
                 WHERE application_id = $application_id \
                 ORDER BY is_primary DESC, created_at ASC",
            )
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DependencyRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_model())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
