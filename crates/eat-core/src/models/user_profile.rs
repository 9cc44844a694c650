//! User profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC-format hash. Never serialized — keeps the hash out
    /// of API responses and audit snapshots alike.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    /// Soft-deactivation flag. Profiles are never hard-deleted while
    /// the account exists.
    pub is_active: bool,
    pub department: String,
    pub phone: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserProfile {
    pub username: String,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: Role,
    pub department: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserProfile {
    pub email: Option<String>,
    /// Role reassignment — an ApplicationAdmin-only operation,
    /// enforced upstream.
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub department: Option<String>,
    pub phone: Option<String>,
}
