//! First-run RBAC bootstrap.
//!
//! A fresh deployment has no accounts, so nobody could pass the
//! ManageUsers check to create one. If no active application admin
//! exists and bootstrap credentials are configured, one is seeded as
//! a system action (audited like any other user creation).

use tracing::{info, warn};

use eat_core::error::EatResult;
use eat_core::models::role::Role;
use eat_core::models::user_profile::{CreateUserProfile, UserProfile};
use eat_core::repository::{AuditContext, UserProfileRepository};

use crate::config::ServerConfig;

pub async fn ensure_admin<U: UserProfileRepository>(
    users: &U,
    config: &ServerConfig,
) -> EatResult<Option<UserProfile>> {
    let existing = users.count_by_role(Role::ApplicationAdmin).await?;
    if existing > 0 {
        return Ok(None);
    }

    let (Some(username), Some(password)) = (
        config.bootstrap_admin_username.clone(),
        config.bootstrap_admin_password.clone(),
    ) else {
        warn!(
            "no active application admin exists and no bootstrap credentials \
             are configured (EAT_ADMIN_USERNAME / EAT_ADMIN_PASSWORD)"
        );
        return Ok(None);
    };

    let email = config
        .bootstrap_admin_email
        .clone()
        .unwrap_or_else(|| format!("{username}@localhost"));

    let admin = users
        .create(
            CreateUserProfile {
                username,
                email,
                password,
                role: Role::ApplicationAdmin,
                department: String::new(),
                phone: String::new(),
            },
            &AuditContext::system(),
        )
        .await?;

    info!(username = %admin.username, "seeded initial application admin");
    Ok(Some(admin))
}
