// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session identity, roles and permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Dashboard role carried in the token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    Admin,
    Moderator,
    User,
    /// Any role string the dashboard does not know about. Grants nothing.
    #[serde(other)]
    Unknown,
}

/// Action a role may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Moderate,
    Delete,
    ManageUsers,
    ManageSettings,
}

const MODERATOR_PERMISSIONS: &[Permission] =
    &[Permission::Read, Permission::Write, Permission::Moderate];
const USER_PERMISSIONS: &[Permission] = &[Permission::Read];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
            Role::Unknown => "unknown",
        }
    }

    /// Static role -> permission mapping. Admin holds every permission.
    pub fn grants(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Moderator => MODERATOR_PERMISSIONS.contains(&permission),
            Role::User => USER_PERMISSIONS.contains(&permission),
            Role::Unknown => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(UnknownName(other.to_string())),
        }
    }
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Moderate => "moderate",
            Permission::Delete => "delete",
            Permission::ManageUsers => "manage_users",
            Permission::ManageSettings => "manage_settings",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "moderate" => Ok(Permission::Moderate),
            "delete" => Ok(Permission::Delete),
            "manage_users" => Ok(Permission::ManageUsers),
            "manage_settings" => Ok(Permission::ManageSettings),
            other => Err(UnknownName(other.to_string())),
        }
    }
}

/// Role or permission name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name: {0}")]
pub struct UnknownName(pub String);

/// Claims decoded from the token's middle segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject id (`sub`, falling back to `id` then `user_id`)
    pub subject: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub avatar: Option<String>,
}

/// Identity of the signed-in user, projected from token claims.
///
/// Never stored on its own: it is recomputed from the token each time the
/// token is loaded or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub avatar: Option<String>,
}

impl Identity {
    /// Project claims into an identity. `None` if the timestamps are out of range.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        let issued_at = DateTime::from_timestamp(claims.iat, 0)?;

        Some(Self {
            id: claims.subject.clone(),
            email: claims.email.clone(),
            first_name: claims.first_name.clone().unwrap_or_default(),
            last_name: claims.last_name.clone().unwrap_or_default(),
            role: claims.role,
            is_active: claims.is_active.unwrap_or(true),
            created_at: issued_at,
            last_login_at: issued_at,
            avatar: claims.avatar.clone(),
        })
    }

    /// "First Last", or the email when no name is on record.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_table() {
        assert!(Role::Admin.grants(Permission::Moderate));
        assert!(Role::Admin.grants(Permission::ManageSettings));
        assert!(Role::Moderator.grants(Permission::Moderate));
        assert!(Role::Moderator.grants(Permission::Write));
        assert!(!Role::Moderator.grants(Permission::Delete));
        assert!(Role::User.grants(Permission::Read));
        assert!(!Role::User.grants(Permission::Moderate));
        assert!(!Role::Unknown.grants(Permission::Read));
    }

    #[test]
    fn test_unknown_role_deserializes() {
        let role: Role = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(role, Role::Unknown);
        let role: Role = serde_json::from_str("\"moderator\"").unwrap();
        assert_eq!(role, Role::Moderator);
    }

    #[test]
    fn test_role_and_permission_parse() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
        assert_eq!("moderate".parse::<Permission>(), Ok(Permission::Moderate));
        assert_eq!(Permission::ManageUsers.to_string(), "manage_users");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let claims = Claims {
            subject: "42".to_string(),
            email: "ops@example.com".to_string(),
            role: Role::User,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            first_name: None,
            last_name: None,
            is_active: None,
            avatar: None,
        };
        let identity = Identity::from_claims(&claims).unwrap();
        assert_eq!(identity.display_name(), "ops@example.com");
        assert!(identity.is_active);
        assert_eq!(identity.created_at.timestamp(), 1_700_000_000);
    }
}
