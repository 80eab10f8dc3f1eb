use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

pub const SESSION_COOKIE_NAME: &str = "hrms_session";

/// What the browser is allowed to know about the signed-in user.
///
/// Tokens stay on the server; this is derived from the stored session and a
/// role lookup on every `current_session` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub expires_at: Timestamp,
}

impl SessionInfo {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn email_or_unknown(&self) -> &str {
        self.email.as_deref().unwrap_or("unknown user")
    }
}
