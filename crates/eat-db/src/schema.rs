//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The audit log table is defined
//! append-only: no update or delete is permitted at the schema level.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- User profiles
-- =======================================================================
DEFINE TABLE user_profile SCHEMAFULL;
DEFINE FIELD username ON TABLE user_profile TYPE string;
DEFINE FIELD email ON TABLE user_profile TYPE string;
DEFINE FIELD password_hash ON TABLE user_profile TYPE string;
DEFINE FIELD role ON TABLE user_profile TYPE string \
    ASSERT $value IN ['business_user', 'business_manager', \
    'technician', 'systems_manager', 'application_admin'];
DEFINE FIELD is_active ON TABLE user_profile TYPE bool DEFAULT true;
DEFINE FIELD department ON TABLE user_profile TYPE string DEFAULT '';
DEFINE FIELD phone ON TABLE user_profile TYPE string DEFAULT '';
DEFINE FIELD created_by ON TABLE user_profile TYPE option<string>;
DEFINE FIELD created_at ON TABLE user_profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user_profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_profile_username ON TABLE user_profile \
    COLUMNS username UNIQUE;
DEFINE INDEX idx_user_profile_email ON TABLE user_profile \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Record-level grants
-- =======================================================================
DEFINE TABLE record_grant SCHEMAFULL;
DEFINE FIELD user_id ON TABLE record_grant TYPE string;
DEFINE FIELD resource_kind ON TABLE record_grant TYPE string;
DEFINE FIELD resource_id ON TABLE record_grant TYPE string;
DEFINE FIELD kind ON TABLE record_grant TYPE string \
    ASSERT $value IN ['view', 'edit'];
DEFINE FIELD granted_by ON TABLE record_grant TYPE string;
DEFINE FIELD granted_at ON TABLE record_grant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE record_grant TYPE option<datetime>;
DEFINE FIELD notes ON TABLE record_grant TYPE string DEFAULT '';
DEFINE INDEX idx_grant_target ON TABLE record_grant \
    COLUMNS user_id, resource_kind, resource_id, kind UNIQUE;

-- =======================================================================
-- Cloud platforms
-- =======================================================================
DEFINE TABLE cloud_platform SCHEMAFULL;
DEFINE FIELD name ON TABLE cloud_platform TYPE string;
DEFINE FIELD code ON TABLE cloud_platform TYPE string;
DEFINE FIELD description ON TABLE cloud_platform TYPE string DEFAULT '';
DEFINE FIELD public_visible ON TABLE cloud_platform TYPE bool \
    DEFAULT true;
DEFINE FIELD is_active ON TABLE cloud_platform TYPE bool DEFAULT true;
DEFINE FIELD notes ON TABLE cloud_platform TYPE string DEFAULT '';
DEFINE FIELD system_manager_notes ON TABLE cloud_platform \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE cloud_platform TYPE option<string>;
DEFINE FIELD updated_by ON TABLE cloud_platform TYPE option<string>;
DEFINE FIELD created_at ON TABLE cloud_platform TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE cloud_platform TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_cloud_platform_code ON TABLE cloud_platform \
    COLUMNS code UNIQUE;

-- =======================================================================
-- Server environments
-- =======================================================================
DEFINE TABLE server_environment SCHEMAFULL;
DEFINE FIELD name ON TABLE server_environment TYPE string;
DEFINE FIELD hostname ON TABLE server_environment TYPE string;
DEFINE FIELD ip_address ON TABLE server_environment TYPE string;
DEFINE FIELD environment_type ON TABLE server_environment TYPE string \
    ASSERT $value IN ['physical', 'virtual', 'container', 'cloud'];
DEFINE FIELD operating_system ON TABLE server_environment TYPE string;
DEFINE FIELD os_version ON TABLE server_environment TYPE string;
DEFINE FIELD cloud_platform_id ON TABLE server_environment \
    TYPE option<string>;
DEFINE FIELD cloud_instance_id ON TABLE server_environment \
    TYPE option<string>;
DEFINE FIELD cloud_region ON TABLE server_environment \
    TYPE option<string>;
DEFINE FIELD cpu_cores ON TABLE server_environment TYPE option<int>;
DEFINE FIELD memory_gb ON TABLE server_environment TYPE option<int>;
DEFINE FIELD storage_gb ON TABLE server_environment TYPE option<int>;
DEFINE FIELD public_visible ON TABLE server_environment TYPE bool \
    DEFAULT true;
DEFINE FIELD is_active ON TABLE server_environment TYPE bool \
    DEFAULT true;
DEFINE FIELD notes ON TABLE server_environment TYPE string DEFAULT '';
DEFINE FIELD system_manager_notes ON TABLE server_environment \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE server_environment \
    TYPE option<string>;
DEFINE FIELD updated_by ON TABLE server_environment \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE server_environment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE server_environment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_server_hostname ON TABLE server_environment \
    COLUMNS hostname UNIQUE;

-- =======================================================================
-- Data stores
-- =======================================================================
DEFINE TABLE data_store SCHEMAFULL;
DEFINE FIELD name ON TABLE data_store TYPE string;
DEFINE FIELD datastore_type ON TABLE data_store TYPE string \
    ASSERT $value IN ['relational', 'nosql', 'cache', 'search', \
    'file', 'object', 'queue'];
DEFINE FIELD description ON TABLE data_store TYPE string DEFAULT '';
DEFINE FIELD public_visible ON TABLE data_store TYPE bool DEFAULT true;
DEFINE FIELD is_active ON TABLE data_store TYPE bool DEFAULT true;
DEFINE FIELD notes ON TABLE data_store TYPE string DEFAULT '';
DEFINE FIELD system_manager_notes ON TABLE data_store \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE data_store TYPE option<string>;
DEFINE FIELD updated_by ON TABLE data_store TYPE option<string>;
DEFINE FIELD created_at ON TABLE data_store TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE data_store TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_data_store_name ON TABLE data_store \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Data store instances
-- =======================================================================
DEFINE TABLE data_store_instance SCHEMAFULL;
DEFINE FIELD server_id ON TABLE data_store_instance TYPE string;
DEFINE FIELD datastore_id ON TABLE data_store_instance TYPE string;
DEFINE FIELD version ON TABLE data_store_instance TYPE string;
DEFINE FIELD instance_name ON TABLE data_store_instance TYPE string;
DEFINE FIELD port ON TABLE data_store_instance TYPE option<int>;
DEFINE FIELD connection_string ON TABLE data_store_instance \
    TYPE option<string>;
DEFINE FIELD public_visible ON TABLE data_store_instance TYPE bool \
    DEFAULT true;
DEFINE FIELD is_active ON TABLE data_store_instance TYPE bool \
    DEFAULT true;
DEFINE FIELD notes ON TABLE data_store_instance TYPE string DEFAULT '';
DEFINE FIELD system_manager_notes ON TABLE data_store_instance \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE data_store_instance \
    TYPE option<string>;
DEFINE FIELD updated_by ON TABLE data_store_instance \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE data_store_instance TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE data_store_instance TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_dsi_server_instance ON TABLE data_store_instance \
    COLUMNS server_id, instance_name UNIQUE;

-- =======================================================================
-- Applications
-- =======================================================================
DEFINE TABLE application SCHEMAFULL;
DEFINE FIELD name ON TABLE application TYPE string;
DEFINE FIELD description ON TABLE application TYPE string DEFAULT '';
DEFINE FIELD business_purpose ON TABLE application TYPE string \
    DEFAULT '';
DEFINE FIELD lifecycle_stage ON TABLE application TYPE string \
    ASSERT $value IN ['planning', 'development', 'testing', 'staging', \
    'production', 'maintenance', 'deprecated', 'retired'];
DEFINE FIELD criticality ON TABLE application TYPE string \
    ASSERT $value IN ['low', 'medium', 'high', 'critical'];
DEFINE FIELD business_owner ON TABLE application TYPE string \
    DEFAULT '';
DEFINE FIELD technical_owner ON TABLE application TYPE string \
    DEFAULT '';
DEFINE FIELD primary_server_id ON TABLE application TYPE string;
DEFINE FIELD version ON TABLE application TYPE string DEFAULT '';
DEFINE FIELD deployment_path ON TABLE application TYPE string \
    DEFAULT '';
DEFINE FIELD public_visible ON TABLE application TYPE bool \
    DEFAULT true;
DEFINE FIELD is_active ON TABLE application TYPE bool DEFAULT true;
DEFINE FIELD notes ON TABLE application TYPE string DEFAULT '';
DEFINE FIELD system_manager_notes ON TABLE application \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE application TYPE option<string>;
DEFINE FIELD updated_by ON TABLE application TYPE option<string>;
DEFINE FIELD created_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_application_name ON TABLE application COLUMNS name;

-- =======================================================================
-- Application data-store dependencies
-- =======================================================================
DEFINE TABLE app_datastore_dependency SCHEMAFULL;
DEFINE FIELD application_id ON TABLE app_datastore_dependency \
    TYPE string;
DEFINE FIELD datastore_instance_id ON TABLE app_datastore_dependency \
    TYPE string;
DEFINE FIELD is_primary ON TABLE app_datastore_dependency TYPE bool \
    DEFAULT false;
DEFINE FIELD connection_type ON TABLE app_datastore_dependency \
    TYPE string DEFAULT '';
DEFINE FIELD notes ON TABLE app_datastore_dependency TYPE string \
    DEFAULT '';
DEFINE FIELD system_manager_notes ON TABLE app_datastore_dependency \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE app_datastore_dependency \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE app_datastore_dependency \
    TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_dependency_app_instance \
    ON TABLE app_datastore_dependency \
    COLUMNS application_id, datastore_instance_id UNIQUE;

-- =======================================================================
-- Application lifecycle events (append-only)
-- =======================================================================
DEFINE TABLE lifecycle_event SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD application_id ON TABLE lifecycle_event TYPE string;
DEFINE FIELD from_stage ON TABLE lifecycle_event TYPE option<string>;
DEFINE FIELD to_stage ON TABLE lifecycle_event TYPE string;
DEFINE FIELD performed_by ON TABLE lifecycle_event TYPE string;
DEFINE FIELD notes ON TABLE lifecycle_event TYPE string DEFAULT '';
DEFINE FIELD event_date ON TABLE lifecycle_event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_lifecycle_app ON TABLE lifecycle_event \
    COLUMNS application_id, event_date;

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD actor_name ON TABLE audit_log TYPE string;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['CREATE', 'UPDATE', 'DELETE', 'VIEW', 'LOGIN', \
    'LOGIN_FAILED'];
DEFINE FIELD resource_kind ON TABLE audit_log TYPE string;
DEFINE FIELD resource_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD detail ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD ip_address ON TABLE audit_log TYPE option<string>;
DEFINE FIELD user_agent ON TABLE audit_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_resource ON TABLE audit_log \
    COLUMNS resource_kind, resource_id, timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log \
    COLUMNS actor_id, timestamp;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );

            db.query(migration.sql)
                .await?
                .check()
                .map_err(|e| DbError::Migration(e.to_string()))?;

            db.query("CREATE _migration SET version = $version, name = $name")
                .bind(("version", migration.version))
                .bind(("name", migration.name.to_string()))
                .await?
                .check()
                .map_err(|e| DbError::Migration(e.to_string()))?;
        }
    }

    Ok(())
}
