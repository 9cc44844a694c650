//! SurrealDB implementation of the audit log repository.
//!
//! The table is append-only at the schema level; this repository
//! exposes only `append` and a filtered read. Entries are returned in
//! timestamp order, which for any single resource is the order its
//! mutations committed.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::error::EatResult;
use eat_core::models::audit::{AuditAction, AuditEntry, AuditFilter, CreateAuditEntry};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::{AuditRepository, PaginatedResult, Pagination};

use crate::error::DbError;
use crate::repository::{CountRow, parse_opt_uuid, parse_uuid};

fn parse_action(s: &str) -> Result<AuditAction, DbError> {
    AuditAction::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown audit action: {s}")))
}

fn parse_resource_kind(s: &str) -> Result<ResourceKind, DbError> {
    ResourceKind::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown resource kind: {s}")))
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    actor_id: Option<String>,
    actor_name: String,
    action: String,
    resource_kind: String,
    resource_id: Option<String>,
    detail: serde_json::Value,
    ip_address: Option<String>,
    user_agent: Option<String>,
    timestamp: DateTime<Utc>,
}

impl AuditRowWithId {
    fn try_into_model(self) -> Result<AuditEntry, DbError> {
        Ok(AuditEntry {
            id: parse_uuid("audit_log", &self.record_id)?,
            timestamp: self.timestamp,
            actor_id: parse_opt_uuid("actor", self.actor_id)?,
            actor_name: self.actor_name,
            action: parse_action(&self.action)?,
            resource_kind: parse_resource_kind(&self.resource_kind)?,
            resource_id: self.resource_id,
            detail: self.detail,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        })
    }
}

/// SurrealDB implementation of the audit log.
#[derive(Clone)]
pub struct SurrealAuditRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Build the conjunctive WHERE clause for a filter. Bind names match
/// the filter fields.
fn filter_clause(filter: &AuditFilter) -> String {
    let mut conditions = Vec::new();
    if filter.actor_id.is_some() {
        conditions.push("actor_id = $actor_id");
    }
    if filter.action.is_some() {
        conditions.push("action = $action");
    }
    if filter.resource_kind.is_some() {
        conditions.push("resource_kind = $resource_kind");
    }
    if filter.resource_id.is_some() {
        conditions.push("resource_id = $resource_id");
    }
    if filter.since.is_some() {
        conditions.push("timestamp >= $since");
    }
    if filter.until.is_some() {
        conditions.push("timestamp < $until");
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Bind values for [`filter_clause`]. Binding the struct makes each
/// field a query variable; fields the clause does not reference are
/// simply unused.
#[derive(Debug, SurrealValue)]
struct FilterBinds {
    actor_id: Option<String>,
    action: Option<String>,
    resource_kind: Option<String>,
    resource_id: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl FilterBinds {
    fn from_filter(filter: &AuditFilter) -> Self {
        Self {
            actor_id: filter.actor_id.map(|u| u.to_string()),
            action: filter.action.map(|a| a.as_str().to_string()),
            resource_kind: filter.resource_kind.map(|k| k.as_str().to_string()),
            resource_id: filter.resource_id.clone(),
            since: filter.since,
            until: filter.until,
        }
    }
}

impl<C: Connection> AuditRepository for SurrealAuditRepository<C> {
    async fn append(&self, entry: CreateAuditEntry) -> EatResult<AuditEntry> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 actor_id = $actor_id, \
                 actor_name = $actor_name, \
                 action = $action, \
                 resource_kind = $resource_kind, \
                 resource_id = $resource_id, \
                 detail = $detail, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 timestamp = $timestamp",
            )
            .bind(("id", id.to_string()))
            .bind(("actor_id", entry.actor_id.map(|u| u.to_string())))
            .bind(("actor_name", entry.actor_name.clone()))
            .bind(("action", entry.action.as_str().to_string()))
            .bind(("resource_kind", entry.resource_kind.as_str().to_string()))
            .bind(("resource_id", entry.resource_id.clone()))
            .bind(("detail", entry.detail.clone()))
            .bind(("ip_address", entry.ip_address.clone()))
            .bind(("user_agent", entry.user_agent.clone()))
            .bind(("timestamp", now))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(AuditEntry {
            id,
            timestamp: now,
            actor_id: entry.actor_id,
            actor_name: entry.actor_name,
            action: entry.action,
            resource_kind: entry.resource_kind,
            resource_id: entry.resource_id,
            detail: entry.detail,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
        })
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> EatResult<PaginatedResult<AuditEntry>> {
        let clause = filter_clause(&filter);

        let count_sql = format!("SELECT count() AS total FROM audit_log {clause} GROUP ALL");
        let mut count_result = self
            .db
            .query(count_sql)
            .bind(FilterBinds::from_filter(&filter))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_sql = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log {clause} \
             ORDER BY timestamp ASC \
             LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(page_sql)
            .bind(FilterBinds::from_filter(&filter))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;
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
