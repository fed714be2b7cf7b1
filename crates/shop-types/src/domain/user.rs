use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::validation::{looks_like_email, require_text, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Customer" => Some(Role::Customer),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored account. `password_hash` never leaves the service layer; use
/// [`UserProfile`] for anything serialised to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

impl Registration {
    /// Returns the requested role (Customer when omitted).
    pub fn validate(&self) -> Result<Role, ValidationError> {
        let mut details = Vec::new();
        require_text(&mut details, "name", &self.name);
        if self.email.trim().is_empty() {
            details.push("email is required".into());
        } else if !looks_like_email(self.email.trim()) {
            details.push("email must be a valid email".into());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            details.push(format!(
                "password length must be at least {MIN_PASSWORD_LEN} characters long"
            ));
        }
        let role = match self.role.as_deref() {
            None => Role::Customer,
            Some(r) => Role::parse(r).unwrap_or_else(|| {
                details.push("role must be one of [Customer, Admin]".into());
                Role::Customer
            }),
        };
        ValidationError::check(details)?;
        Ok(role)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut details = Vec::new();
        if self.email.trim().is_empty() {
            details.push("email is required".into());
        } else if !looks_like_email(self.email.trim()) {
            details.push("email must be a valid email".into());
        }
        if self.password.is_empty() {
            details.push("password is required".into());
        }
        ValidationError::check(details)
    }
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            role: self.role,
        }
    }
}
