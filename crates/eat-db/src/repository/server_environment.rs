//! SurrealDB implementation of the server environment repository.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::audit::{diff_fields, snapshot};
use eat_core::error::EatResult;
use eat_core::models::audit::AuditAction;
use eat_core::models::kind::ResourceKind;
use eat_core::models::server_environment::{
    CreateServerEnvironment, EnvironmentType, ServerEnvironment, UpdateServerEnvironment,
};
use eat_core::repository::{AuditContext, PaginatedResult, Pagination, ResourceRepository};

use crate::error::DbError;
use crate::repository::{AuditBinds, CountRow, parse_opt_uuid, parse_uuid, with_audit};

fn parse_environment_type(s: &str) -> Result<EnvironmentType, DbError> {
    EnvironmentType::parse(s)
        .ok_or_else(|| DbError::Corrupt(format!("unknown environment type: {s}")))
}

#[derive(Debug, SurrealValue)]
struct ServerEnvironmentRow {
    name: String,
    hostname: String,
    ip_address: String,
    environment_type: String,
    operating_system: String,
    os_version: String,
    cloud_platform_id: Option<String>,
    cloud_instance_id: Option<String>,
    cloud_region: Option<String>,
    cpu_cores: Option<u32>,
    memory_gb: Option<u32>,
    storage_gb: Option<u32>,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServerEnvironmentRow {
    fn from_model(m: &ServerEnvironment) -> Self {
        Self {
            name: m.name.clone(),
            hostname: m.hostname.clone(),
            ip_address: m.ip_address.clone(),
            environment_type: m.environment_type.as_str().to_string(),
            operating_system: m.operating_system.clone(),
            os_version: m.os_version.clone(),
            cloud_platform_id: m.cloud_platform_id.map(|u| u.to_string()),
            cloud_instance_id: m.cloud_instance_id.clone(),
            cloud_region: m.cloud_region.clone(),
            cpu_cores: m.cpu_cores,
            memory_gb: m.memory_gb,
            storage_gb: m.storage_gb,
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

    fn into_model(self, id: Uuid) -> Result<ServerEnvironment, DbError> {
        Ok(ServerEnvironment {
            id,
            name: self.name,
            hostname: self.hostname,
            ip_address: self.ip_address,
            environment_type: parse_environment_type(&self.environment_type)?,
            operating_system: self.operating_system,
            os_version: self.os_version,
            cloud_platform_id: parse_opt_uuid("cloud_platform", self.cloud_platform_id)?,
            cloud_instance_id: self.cloud_instance_id,
            cloud_region: self.cloud_region,
            cpu_cores: self.cpu_cores,
            memory_gb: self.memory_gb,
            storage_gb: self.storage_gb,
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
struct ServerEnvironmentRowWithId {
    record_id: String,
    name: String,
    hostname: String,
    ip_address: String,
    environment_type: String,
    operating_system: String,
    os_version: String,
    cloud_platform_id: Option<String>,
    cloud_instance_id: Option<String>,
    cloud_region: Option<String>,
    cpu_cores: Option<u32>,
    memory_gb: Option<u32>,
    storage_gb: Option<u32>,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServerEnvironmentRowWithId {
    fn try_into_model(self) -> Result<ServerEnvironment, DbError> {
        let id = parse_uuid("server_environment", &self.record_id)?;
        ServerEnvironmentRow {
            name: self.name,
            hostname: self.hostname,
            ip_address: self.ip_address,
            environment_type: self.environment_type,
            operating_system: self.operating_system,
            os_version: self.os_version,
            cloud_platform_id: self.cloud_platform_id,
            cloud_instance_id: self.cloud_instance_id,
            cloud_region: self.cloud_region,
            cpu_cores: self.cpu_cores,
            memory_gb: self.memory_gb,
            storage_gb: self.storage_gb,
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

fn apply_update(model: &mut ServerEnvironment, input: UpdateServerEnvironment) {
    if let Some(name) = input.name {
        model.name = name;
    }
    if let Some(hostname) = input.hostname {
        model.hostname = hostname;
    }
    if let Some(ip_address) = input.ip_address {
        model.ip_address = ip_address;
    }
    if let Some(environment_type) = input.environment_type {
        model.environment_type = environment_type;
    }
    if let Some(operating_system) = input.operating_system {
        model.operating_system = operating_system;
    }
    if let Some(os_version) = input.os_version {
        model.os_version = os_version;
    }
    if let Some(cloud_platform_id) = input.cloud_platform_id {
        model.cloud_platform_id = cloud_platform_id;
    }
    if let Some(cloud_instance_id) = input.cloud_instance_id {
        model.cloud_instance_id = cloud_instance_id;
    }
    if let Some(cloud_region) = input.cloud_region {
        model.cloud_region = cloud_region;
    }
    if let Some(cpu_cores) = input.cpu_cores {
        model.cpu_cores = cpu_cores;
    }
    if let Some(memory_gb) = input.memory_gb {
        model.memory_gb = memory_gb;
    }
    if let Some(storage_gb) = input.storage_gb {
        model.storage_gb = storage_gb;
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

/// SurrealDB implementation of the ServerEnvironment repository.
#[derive(Clone)]
pub struct SurrealServerEnvironmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServerEnvironmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository<ServerEnvironment>
    for SurrealServerEnvironmentRepository<C>
{
    async fn create(
        &self,
        input: CreateServerEnvironment,
        ctx: &AuditContext,
    ) -> EatResult<ServerEnvironment> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = ServerEnvironment {
            id,
            name: input.name,
            hostname: input.hostname,
            ip_address: input.ip_address,
            environment_type: input.environment_type,
            operating_system: input.operating_system,
            os_version: input.os_version,
            cloud_platform_id: input.cloud_platform_id,
            cloud_instance_id: input.cloud_instance_id,
            cloud_region: input.cloud_region,
            cpu_cores: input.cpu_cores,
            memory_gb: input.memory_gb,
            storage_gb: input.storage_gb,
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
            ResourceKind::ServerEnvironment,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "CREATE type::record('server_environment', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", ServerEnvironmentRow::from_model(&model)));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn get(&self, id: Uuid) -> EatResult<ServerEnvironment> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('server_environment', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServerEnvironmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "server_environment".into(),
            id: id_str,
        })?;

        Ok(row.into_model(id)?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateServerEnvironment,
        ctx: &AuditContext,
    ) -> EatResult<ServerEnvironment> {
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
            ResourceKind::ServerEnvironment,
            Some(id.to_string()),
            serde_json::Value::Object(changes),
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('server_environment', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", ServerEnvironmentRow::from_model(&model)));
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
            ResourceKind::ServerEnvironment,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('server_environment', $id) SET \
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

    async fn list(&self, pagination: Pagination) -> EatResult<PaginatedResult<ServerEnvironment>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM server_environment GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM server_environment \
                 ORDER BY hostname ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServerEnvironmentRowWithId> = result.take(0).map_err(DbError::from)?;
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
