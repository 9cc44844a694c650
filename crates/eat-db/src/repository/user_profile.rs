//! SurrealDB implementation of the user profile repository.
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.
//!
//! User management is itself audited: create, update (including role
//! reassignment), and deactivation each commit an audit entry in the
//! same transaction. Audit snapshots never contain the password hash —
//! the domain model skips it during serialization.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use eat_core::audit::{diff_fields, snapshot};
use eat_core::error::EatResult;
use eat_core::models::audit::AuditAction;
use eat_core::models::kind::ResourceKind;
use eat_core::models::role::Role;
use eat_core::models::user_profile::{CreateUserProfile, UpdateUserProfile, UserProfile};
use eat_core::repository::{AuditContext, PaginatedResult, Pagination, UserProfileRepository};

use crate::error::DbError;
use crate::repository::{AuditBinds, CountRow, parse_opt_uuid, parse_uuid, with_audit};

fn parse_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown role: {s}")))
}

#[derive(Debug, SurrealValue)]
struct UserProfileRow {
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    department: String,
    phone: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserProfileRow {
    fn from_model(m: &UserProfile) -> Self {
        Self {
            username: m.username.clone(),
            email: m.email.clone(),
            password_hash: m.password_hash.clone(),
            role: m.role.as_str().to_string(),
            is_active: m.is_active,
            department: m.department.clone(),
            phone: m.phone.clone(),
            created_by: m.created_by.map(|u| u.to_string()),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    fn into_model(self, id: Uuid) -> Result<UserProfile, DbError> {
        Ok(UserProfile {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            is_active: self.is_active,
            department: self.department,
            phone: self.phone,
            created_by: parse_opt_uuid("created_by", self.created_by)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserProfileRowWithId {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    department: String,
    phone: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserProfileRowWithId {
    fn try_into_model(self) -> Result<UserProfile, DbError> {
        let id = parse_uuid("user_profile", &self.record_id)?;
        UserProfileRow {
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            is_active: self.is_active,
            department: self.department,
            phone: self.phone,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_model(id)
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Corrupt(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Corrupt(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the UserProfile repository.
#[derive(Clone)]
pub struct SurrealUserProfileRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserProfileRepository for SurrealUserProfileRepository<C> {
    async fn create(&self, input: CreateUserProfile, ctx: &AuditContext) -> EatResult<UserProfile> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let model = UserProfile {
            id,
            username: input.username,
            email: input.email,
            password_hash,
            role: input.role,
            is_active: true,
            department: input.department,
            phone: input.phone,
            created_by: ctx.actor_id,
            created_at: now,
            updated_at: now,
        };

        // The model's serialization skips password_hash, so the audit
        // snapshot is hash-free.
        let detail = snapshot(&model)?;
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Create,
            ResourceKind::UserProfile,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "CREATE type::record('user_profile', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", UserProfileRow::from_model(&model)));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn get_by_id(&self, id: Uuid) -> EatResult<UserProfile> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user_profile', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user_profile".into(),
            id: id_str,
        })?;

        Ok(row.into_model(id)?)
    }

    async fn get_by_username(&self, username: &str) -> EatResult<UserProfile> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_profile \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserProfileRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user_profile".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_model()?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateUserProfile,
        ctx: &AuditContext,
    ) -> EatResult<UserProfile> {
        let old = self.get_by_id(id).await?;
        let mut model = old.clone();
        if let Some(email) = input.email {
            model.email = email;
        }
        if let Some(role) = input.role {
            model.role = role;
        }
        if let Some(is_active) = input.is_active {
            model.is_active = is_active;
        }
        if let Some(department) = input.department {
            model.department = department;
        }
        if let Some(phone) = input.phone {
            model.phone = phone;
        }

        let changes = diff_fields(&snapshot(&old)?, &snapshot(&model)?);
        if changes.is_empty() {
            return Ok(old);
        }

        let now = Utc::now();
        model.updated_at = now;

        let audit = AuditBinds::new(
            ctx,
            AuditAction::Update,
            ResourceKind::UserProfile,
            Some(id.to_string()),
            serde_json::Value::Object(changes),
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('user_profile', $id) CONTENT $row;",
            ))
            .bind(("id", id.to_string()))
            .bind(("row", UserProfileRow::from_model(&model)));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(model)
    }

    async fn deactivate(&self, id: Uuid, ctx: &AuditContext) -> EatResult<()> {
        let old = self.get_by_id(id).await?;
        if !old.is_active {
            return Ok(());
        }

        let now = Utc::now();
        let detail = snapshot(&old)?;
        let audit = AuditBinds::new(
            ctx,
            AuditAction::Delete,
            ResourceKind::UserProfile,
            Some(id.to_string()),
            detail,
            now,
        );

        let query = self
            .db
            .query(with_audit(
                "UPDATE type::record('user_profile', $id) SET \
                 is_active = false, updated_at = $now;",
            ))
            .bind(("id", id.to_string()))
            .bind(("now", now));
        query
            .bind(audit)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> EatResult<PaginatedResult<UserProfile>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user_profile GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_profile \
                 ORDER BY username ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserProfileRowWithId> = result.take(0).map_err(DbError::from)?;
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

    async fn count_by_role(&self, role: Role) -> EatResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user_profile \
                 WHERE role = $role AND is_active = true GROUP ALL",
            )
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

/// Verify a password against an Argon2id hash.
///
/// Public for use by the auth layer.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    use argon2::PasswordVerifier;

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Corrupt(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Corrupt(format!("verify error: {e}"))),
    }
}
