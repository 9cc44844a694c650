//! Authentication service — login, refresh, and logout orchestration.
//!
//! Every login attempt ends in exactly one audit entry: LOGIN on
//! success, LOGIN_FAILED otherwise. The entry is appended before any
//! session is created; if the append fails, the login fails.

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use eat_core::error::{EatError, EatResult};
use eat_core::models::audit::{AuditAction, CreateAuditEntry, SYSTEM_ACTOR};
use eat_core::models::kind::ResourceKind;
use eat_core::models::session::CreateSession;
use eat_core::models::user_profile::UserProfile;
use eat_core::repository::{AuditRepository, SessionRepository, UserProfileRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token (carries the user's role).
    pub access_token: String,
    /// Raw opaque refresh token (return to client, not stored).
    pub refresh_token: String,
    /// Session ID (can be used for logout).
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U, S, A>
where
    U: UserProfileRepository,
    S: SessionRepository,
    A: AuditRepository,
{
    user_repo: U,
    session_repo: S,
    audit_repo: A,
    config: AuthConfig,
}

/// Why a login attempt failed — recorded in the audit detail payload
/// (admin-visible), never surfaced to the caller.
enum FailureReason {
    InvalidCredentials,
    AccountInactive,
}

impl FailureReason {
    fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidCredentials => "invalid_credentials",
            FailureReason::AccountInactive => "account_inactive",
        }
    }
}

impl<U, S, A> AuthService<U, S, A>
where
    U: UserProfileRepository,
    S: SessionRepository,
    A: AuditRepository,
{
    pub fn new(user_repo: U, session_repo: S, audit_repo: A, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            audit_repo,
            config,
        }
    }

    /// Authenticate a user with username + password and issue tokens.
    ///
    /// All failure modes surface the same `invalid credentials` error;
    /// the audit entry carries the precise reason for admins.
    pub async fn login(&self, input: LoginInput) -> EatResult<LoginOutput> {
        // 1. Look up user.
        let user = match self.user_repo.get_by_username(&input.username).await {
            Ok(u) => u,
            Err(EatError::NotFound { .. }) => {
                return self
                    .fail_login(&input, None, FailureReason::InvalidCredentials)
                    .await;
            }
            Err(e) => return Err(e),
        };

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(|e| EatError::Crypto(e.to_string()))?;

        if !valid {
            return self
                .fail_login(&input, Some(&user), FailureReason::InvalidCredentials)
                .await;
        }

        // 3. Deactivated accounts cannot log in.
        if !user.is_active {
            return self
                .fail_login(&input, Some(&user), FailureReason::AccountInactive)
                .await;
        }

        // 4. Record the successful login before issuing anything.
        self.audit_repo
            .append(CreateAuditEntry {
                actor_id: Some(user.id),
                actor_name: user.username.clone(),
                action: AuditAction::Login,
                resource_kind: ResourceKind::UserProfile,
                resource_id: Some(user.id.to_string()),
                detail: json!({ "username": user.username }),
                ip_address: input.ip_address.clone(),
                user_agent: input.user_agent.clone(),
            })
            .await?;

        // 5. Generate refresh token and create session.
        let raw_refresh = token::generate_refresh_token();
        let token_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 6. Issue JWT access token carrying the role.
        let access_token =
            token::issue_access_token(user.id, &user.username, user.role, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Rotate a refresh token: consume the old one, verify the user
    /// is still active, and issue a new token pair.
    ///
    /// Each refresh token is single-use — the old session is
    /// invalidated before the new one is created.
    pub async fn refresh(&self, input: RefreshInput) -> EatResult<LoginOutput> {
        // 1. Look up session by token hash.
        let token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                EatError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        // 2. Check session expiry.
        if session.expires_at <= Utc::now() {
            // Invalidate the expired session and reject.
            let _ = self.session_repo.invalidate(session.id).await;
            return Err(AuthError::TokenExpired.into());
        }

        // 3. Invalidate old session (single-use guarantee).
        self.session_repo.invalidate(session.id).await?;

        // 4. Verify user is still active.
        let user = self.user_repo.get_by_id(session.user_id).await?;
        if !user.is_active {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 5. Create new session with rotated refresh token.
        let raw_refresh = token::generate_refresh_token();
        let new_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let new_session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: new_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 6. Issue new access token.
        let access_token =
            token::issue_access_token(user.id, &user.username, user.role, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: new_session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Invalidate a single session (logout).
    pub async fn logout(&self, session_id: Uuid) -> EatResult<()> {
        self.session_repo.invalidate(session_id).await
    }

    /// Revoke all sessions for a user (e.g. on deactivation).
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> EatResult<()> {
        self.session_repo.invalidate_user_sessions(user_id).await
    }

    /// Append the LOGIN_FAILED entry, then surface the uniform
    /// credential error.
    async fn fail_login(
        &self,
        input: &LoginInput,
        user: Option<&UserProfile>,
        reason: FailureReason,
    ) -> EatResult<LoginOutput> {
        warn!(username = %input.username, reason = reason.as_str(), "login failed");

        self.audit_repo
            .append(CreateAuditEntry {
                actor_id: user.map(|u| u.id),
                actor_name: user
                    .map(|u| u.username.clone())
                    .unwrap_or_else(|| SYSTEM_ACTOR.into()),
                action: AuditAction::LoginFailed,
                resource_kind: ResourceKind::UserProfile,
                resource_id: user.map(|u| u.id.to_string()),
                detail: json!({
                    "username": input.username,
                    "reason": reason.as_str(),
                }),
                ip_address: input.ip_address.clone(),
                user_agent: input.user_agent.clone(),
            })
            .await?;

        Err(AuthError::InvalidCredentials.into())
    }
}
