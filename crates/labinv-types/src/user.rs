use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Database identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Name of the built-in administrator account.
pub const ADMIN_USERNAME: &str = "admin";

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    /// Authority name with the `ROLE_` prefix (e.g. `ROLE_ADMIN`).
    pub fn authority(&self) -> &'static str {
        match self {
            UserRole::User => "ROLE_USER",
            UserRole::Admin => "ROLE_ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Lenient parse: accepts `ADMIN` and `ROLE_ADMIN` in any case,
    /// anything else is a regular user.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "USER"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "USER" => Ok(UserRole::User),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// A user account. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub position: Option<String>,
    /// Years of service.
    pub duration: i32,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for self-registration and admin user creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(alias = "last_name")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "phone_number")]
    pub phone_number: Option<String>,
    pub position: Option<String>,
    pub duration: Option<i32>,
    /// Only honoured on the admin endpoint.
    pub role: Option<String>,
}

/// Request body for an admin update of a user. Absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    /// Changed only when non-blank.
    pub password: Option<String>,
    #[serde(alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(alias = "last_name")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "phone_number")]
    pub phone_number: Option<String>,
    pub position: Option<String>,
    pub duration: Option<i32>,
    pub role: Option<String>,
}

/// Fields persisted when creating a user. Built by the user service
/// after validation and hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub position: Option<String>,
    pub duration: i32,
    pub role: UserRole,
}

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login: a bearer token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub username: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

/// Capabilities of the current user as shown by the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_read: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_import: bool,
    pub can_export: bool,
    pub can_manage_users: bool,
}

impl Permissions {
    pub fn for_role(role: UserRole) -> Self {
        Self {
            can_read: true,
            can_create: true,
            can_update: true,
            can_delete: role.is_admin(),
            can_import: true,
            can_export: true,
            can_manage_users: role.is_admin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_accepts_both_formats() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("role_admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("ROLE_USER".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_lenient_parse_defaults_to_user() {
        assert_eq!(UserRole::parse_lenient("nonsense"), UserRole::User);
        assert_eq!(UserRole::parse_lenient(" admin "), UserRole::Admin);
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_role_serde_is_uppercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(UserRole::Admin.authority(), "ROLE_ADMIN");
    }

    #[test]
    fn test_register_request_accepts_snake_case_names() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"jo","password":"secret1","first_name":"Jo","phoneNumber":"123"}"#,
        )
        .unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Jo"));
        assert_eq!(req.phone_number.as_deref(), Some("123"));
    }

    #[test]
    fn test_permissions_by_role() {
        assert!(!Permissions::for_role(UserRole::User).can_delete);
        assert!(Permissions::for_role(UserRole::Admin).can_manage_users);
    }
}
