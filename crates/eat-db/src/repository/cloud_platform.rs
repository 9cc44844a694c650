//! SurrealDB implementation of the cloud platform repository.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::audit::{diff_fields, snapshot};
use eat_core::error::EatResult;
use eat_core::models::audit::AuditAction;
use eat_core::models::cloud_platform::{CloudPlatform, CreateCloudPlatform, UpdateCloudPlatform};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::{AuditContext, PaginatedResult, Pagination, ResourceRepository};

use crate::error::DbError;
use crate::repository::{AuditBinds, CountRow, parse_opt_uuid, parse_uuid, with_audit};

#[derive(Debug, SurrealValue)]
struct CloudPlatformRow {
    name: String,
    code: String,
    description: String,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CloudPlatformRow {
    fn from_model(m: &CloudPlatform) -> Self {
        Self {
            name: m.name.clone(),
            code: m.code.clone(),
            description: m.description.clone(),
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

    fn into_model(self, id: Uuid) -> Result<CloudPlatform, DbError> {
        Ok(CloudPlatform {
            id,
            name: self.name,
            code: self.code,
            description: self.description,
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

/// Row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CloudPlatformRowWithId {
    record_id: String,
    name: String,
    code: String,
    description: String,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CloudPlatformRowWithId {
    fn try_into_model(self) -> Result<CloudPlatform, DbError> {
        let id = parse_uuid("cloud_platform", &self.record_id)?;
        CloudPlatformRow {
            name: self.name,
            code: self.code,
            description: self.description,
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

fn apply_update(model: &mut CloudPlatform, input: UpdateCloudPlatform) {
    if let Some(name) = input.name {
        model.name = name;
    }
    if let Some(code) = input.code {
        model.code = code;
    }
    if let Some(description) = input.description {
        model.description = description;
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

/// SurrealDB implementation of the CloudPlatform repository.
#[derive(Clone)]
pub struct SurrealCloudPlatformRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCloudPlatformRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository<CloudPlatform> for SurrealCloudPlatformRepository<C> {
    async fn create(
        &self,
        input: CreateCloudPlatform,
        ctx: &AuditContext,
    ) -> EatResult<CloudPlatform> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = CloudPlatform {
            id,
            name: input.name,
            code: input.code,
            description: input.description,
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
            ResourceKind::CloudPlatform,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "CREATE type::record('cloud_platform', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", CloudPlatformRow::from_model(&model)));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn get(&self, id: Uuid) -> EatResult<CloudPlatform> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('cloud_platform', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CloudPlatformRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cloud_platform".into(),
            id: id_str,
        })?;

        Ok(row.into_model(id)?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateCloudPlatform,
        ctx: &AuditContext,
    ) -> EatResult<CloudPlatform> {
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
            ResourceKind::CloudPlatform,
            Some(id.to_string()),
            serde_json::Value::Object(changes),
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('cloud_platform', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", CloudPlatformRow::from_model(&model)));
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
            ResourceKind::CloudPlatform,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('cloud_platform', $id) SET \
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

    async fn list(&self, pagination: Pagination) -> EatResult<PaginatedResult<CloudPlatform>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM cloud_platform GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM cloud_platform \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CloudPlatformRowWithId> = result.take(0).map_err(DbError::from)?;
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
