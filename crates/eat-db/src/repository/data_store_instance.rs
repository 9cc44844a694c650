//! SurrealDB implementation of the data store instance repository.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::audit::{diff_fields, snapshot};
use eat_core::error::EatResult;
use eat_core::models::audit::AuditAction;
use eat_core::models::data_store_instance::{
    CreateDataStoreInstance, DataStoreInstance, UpdateDataStoreInstance,
};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::{AuditContext, PaginatedResult, Pagination, ResourceRepository};

use crate::error::DbError;
use crate::repository::{AuditBinds, CountRow, parse_opt_uuid, parse_uuid, with_audit};

#[derive(Debug, SurrealValue)]
struct DataStoreInstanceRow {
    server_id: String,
    datastore_id: String,
    version: String,
    instance_name: String,
    port: Option<u16>,
    connection_string: Option<String>,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DataStoreInstanceRow {
    fn from_model(m: &DataStoreInstance) -> Self {
        Self {
            server_id: m.server_id.to_string(),
            datastore_id: m.datastore_id.to_string(),
            version: m.version.clone(),
            instance_name: m.instance_name.clone(),
            port: m.port,
            connection_string: m.connection_string.clone(),
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

    fn into_model(self, id: Uuid) -> Result<DataStoreInstance, DbError> {
        Ok(DataStoreInstance {
            id,
            server_id: parse_uuid("server", &self.server_id)?,
            datastore_id: parse_uuid("data_store", &self.datastore_id)?,
            version: self.version,
            instance_name: self.instance_name,
            port: self.port,
            connection_string: self.connection_string,
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
struct DataStoreInstanceRowWithId {
    record_id: String,
    server_id: String,
    datastore_id: String,
    version: String,
    instance_name: String,
    port: Option<u16>,
    connection_string: Option<String>,
    public_visible: bool,
    is_active: bool,
    notes: String,
    system_manager_notes: Option<String>,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DataStoreInstanceRowWithId {
    fn try_into_model(self) -> Result<DataStoreInstance, DbError> {
        let id = parse_uuid("data_store_instance", &self.record_id)?;
        DataStoreInstanceRow {
            server_id: self.server_id,
            datastore_id: self.datastore_id,
            version: self.version,
            instance_name: self.instance_name,
            port: self.port,
            connection_string: self.connection_string,
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

fn apply_update(model: &mut DataStoreInstance, input: UpdateDataStoreInstance) {
    if let Some(version) = input.version {
        model.version = version;
    }
    if let Some(instance_name) = input.instance_name {
        model.instance_name = instance_name;
    }
    if let Some(port) = input.port {
        model.port = port;
    }
    if let Some(connection_string) = input.connection_string {
        model.connection_string = connection_string;
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

/// SurrealDB implementation of the DataStoreInstance repository.
#[derive(Clone)]
pub struct SurrealDataStoreInstanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDataStoreInstanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository<DataStoreInstance>
    for SurrealDataStoreInstanceRepository<C>
{
    async fn create(
        &self,
        input: CreateDataStoreInstance,
        ctx: &AuditContext,
    ) -> EatResult<DataStoreInstance> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = DataStoreInstance {
            id,
            server_id: input.server_id,
            datastore_id: input.datastore_id,
            version: input.version,
            instance_name: input.instance_name,
            port: input.port,
            connection_string: input.connection_string,
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
            ResourceKind::DataStoreInstance,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "CREATE type::record('data_store_instance', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", DataStoreInstanceRow::from_model(&model)));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn get(&self, id: Uuid) -> EatResult<DataStoreInstance> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('data_store_instance', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DataStoreInstanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "data_store_instance".into(),
            id: id_str,
        })?;

        Ok(row.into_model(id)?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateDataStoreInstance,
        ctx: &AuditContext,
    ) -> EatResult<DataStoreInstance> {
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
            ResourceKind::DataStoreInstance,
            Some(id.to_string()),
            serde_json::Value::Object(changes),
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('data_store_instance', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", DataStoreInstanceRow::from_model(&model)));
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
            ResourceKind::DataStoreInstance,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('data_store_instance', $id) SET \
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

    async fn list(&self, pagination: Pagination) -> EatResult<PaginatedResult<DataStoreInstance>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM data_store_instance GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM data_store_instance \
                 ORDER BY instance_name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DataStoreInstanceRowWithId> = result.take(0).map_err(DbError::from)?;
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
