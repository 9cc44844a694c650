//! SurrealDB implementation of the record-level grant store.
//!
//! Expiry is evaluated lazily inside each lookup query — there is no
//! cleanup sweep, and an expired grant answers exactly like an absent
//! one.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::error::EatResult;
use eat_core::models::grant::{CreateRecordGrant, GrantKind, RecordGrant};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::GrantRepository;

use crate::error::DbError;
use crate::repository::{CountRow, parse_uuid};

fn parse_kind(s: &str) -> Result<GrantKind, DbError> {
    GrantKind::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown grant kind: {s}")))
}

fn parse_resource_kind(s: &str) -> Result<ResourceKind, DbError> {
    ResourceKind::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown resource kind: {s}")))
}

#[derive(Debug, SurrealValue)]
struct GrantRowWithId {
    record_id: String,
    user_id: String,
    resource_kind: String,
    resource_id: String,
    kind: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    notes: String,
}

impl GrantRowWithId {
    fn try_into_model(self) -> Result<RecordGrant, DbError> {
        Ok(RecordGrant {
            id: parse_uuid("record_grant", &self.record_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            resource_kind: parse_resource_kind(&self.resource_kind)?,
            resource_id: parse_uuid("resource", &self.resource_id)?,
            kind: parse_kind(&self.kind)?,
            granted_by: parse_uuid("granted_by", &self.granted_by)?,
            granted_at: self.granted_at,
            expires_at: self.expires_at,
            notes: self.notes,
        })
    }
}

/// SurrealDB implementation of the grant store.
#[derive(Clone)]
pub struct SurrealGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_existing(
        &self,
        user_id: Uuid,
        resource_kind: ResourceKind,
        resource_id: Uuid,
        kind: GrantKind,
    ) -> EatResult<Option<RecordGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM record_grant \
                 WHERE user_id = $user_id \
                 AND resource_kind = $resource_kind \
                 AND resource_id = $resource_id \
                 AND kind = $kind",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("resource_kind", resource_kind.as_str().to_string()))
            .bind(("resource_id", resource_id.to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_model().map_err(Into::into))
            .transpose()
    }
}

impl<C: Connection> GrantRepository for SurrealGrantRepository<C> {
    async fn grant(&self, input: CreateRecordGrant) -> EatResult<RecordGrant> {
        // Idempotent upsert: re-granting refreshes expiry, grantor,
        // and notes on the existing row instead of duplicating it.
        if let Some(existing) = self
            .find_existing(input.user_id, input.resource_kind, input.resource_id, input.kind)
            .await?
        {
            let now = Utc::now();
            self.db
                .query(
                    "UPDATE type::record('record_grant', $id) SET \
                     granted_by = $granted_by, granted_at = $granted_at, \
                     expires_at = $expires_at, notes = $notes",
                )
                .bind(("id", existing.id.to_string()))
                .bind(("granted_by", input.granted_by.to_string()))
                .bind(("granted_at", now))
                .bind(("expires_at", input.expires_at))
                .bind(("notes", input.notes.clone()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;

            return Ok(RecordGrant {
                granted_by: input.granted_by,
                granted_at: now,
                expires_at: input.expires_at,
                notes: input.notes,
                ..existing
            });
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.db
            .query(
                "CREATE type::record('record_grant', $id) SET \
                 user_id = $user_id, \
                 resource_kind = $resource_kind, \
                 resource_id = $resource_id, \
                 kind = $kind, \
                 granted_by = $granted_by, \
                 granted_at = $granted_at, \
                 expires_at = $expires_at, \
                 notes = $notes",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("resource_kind", input.resource_kind.as_str().to_string()))
            .bind(("resource_id", input.resource_id.to_string()))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("granted_by", input.granted_by.to_string()))
            .bind(("granted_at", now))
            .bind(("expires_at", input.expires_at))
            .bind(("notes", input.notes.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(RecordGrant {
            id,
            user_id: input.user_id,
            resource_kind: input.resource_kind,
            resource_id: input.resource_id,
            kind: input.kind,
            granted_by: input.granted_by,
            granted_at: now,
            expires_at: input.expires_at,
            notes: input.notes,
        })
    }

    async fn revoke(
        &self,
        user_id: Uuid,
        resource_kind: ResourceKind,
        resource_id: Uuid,
        kind: GrantKind,
    ) -> EatResult<()> {
        self.db
            .query(
                "DELETE record_grant \
                 WHERE user_id = $user_id \
                 AND resource_kind = $resource_kind \
                 AND resource_id = $resource_id \
                 AND kind = $kind",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("resource_kind", resource_kind.as_str().to_string()))
            .bind(("resource_id", resource_id.to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn has_grant(
        &self,
        user_id: Uuid,
        resource_kind: ResourceKind,
        resource_id: Uuid,
        kind: GrantKind,
    ) -> EatResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM record_grant \
                 WHERE user_id = $user_id \
                 AND resource_kind = $resource_kind \
                 AND resource_id = $resource_id \
                 AND kind = $kind \
                 AND (expires_at IS NONE OR expires_at > $now) \
                 GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("resource_kind", resource_kind.as_str().to_string()))
            .bind(("resource_id", resource_id.to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn grants_for_user(&self, user_id: Uuid) -> EatResult<Vec<RecordGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM record_grant \
                 WHERE user_id = $user_id \
                 ORDER BY granted_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_model())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn grants_for_resource(
        &self,
        resource_kind: ResourceKind,
        resource_id: Uuid,
    ) -> EatResult<Vec<RecordGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM record_grant \
                 WHERE resource_kind = $resource_kind \
                 AND resource_id = $resource_id \
                 ORDER BY granted_at DESC",
            )
            .bind(("resource_kind", resource_kind.as_str().to_string()))
            .bind(("resource_id", resource_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_model())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
