use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The shortest password the auth service accepts by default.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    /// Anything other than exactly `admin` is an ordinary member.
    pub fn parse(value: &str) -> Self {
        if value == "admin" {
            Self::Admin
        } else {
            Self::Member
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

/// An account in the auth service, with its role from the role table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: Timestamp,
    pub email_confirmed_at: Option<Timestamp>,
    pub last_sign_in_at: Option<Timestamp>,
}

impl AuthUser {
    pub fn email_or_blank(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

impl NewUser {
    pub fn new(email: &str, password: &str, name: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
            name: non_blank(name),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// A partial update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserChanges {
    /// Diff the edit form against the stored user.
    ///
    /// A blank password means "keep the current one". Clearing the name sends
    /// an empty string so the stored name is removed.
    pub fn between(user: &AuthUser, email: &str, password: &str, name: &str) -> Self {
        let email = email.trim();
        let name = name.trim();

        Self {
            email: (email != user.email_or_blank()).then(|| email.to_string()),
            password: (!password.is_empty()).then(|| password.to_string()),
            name: (name != user.name.as_deref().unwrap_or_default()).then(|| name.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.name.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::bad_request("nothing to update"));
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

    if !valid {
        return Err(Error::bad_request(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Render a timestamp for the user tables.
pub fn display_time(ts: Timestamp) -> String {
    ts.strftime("%Y-%m-%d %H:%M UTC").to_string()
}
