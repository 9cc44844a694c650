//! The authenticated actor attached to a request.

use uuid::Uuid;

use eat_core::models::role::Role;
use eat_core::repository::AuditContext;

/// Who is making the request. Assembled by the transport layer from
/// validated token claims.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub username: String,
    /// `None` when the stored role string did not parse — every
    /// permission check then denies.
    pub role: Option<Role>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn audit_context(&self) -> AuditContext {
        AuditContext {
            actor_id: Some(self.user_id),
            actor_name: self.username.clone(),
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}
