//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Application role carried by every user record and session token.
///
/// Immutable once assigned; no endpoint here mutates it later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Staff,
    Owner,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Owner => "owner",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "staff" => Some(Self::Staff),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signed session token plus the role it carries, returned by every
/// authentication path.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
    pub role: Role,
}

/// Returned when a provider credential verifies but no local user exists yet;
/// the client must complete registration with a role.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RoleRequiredResponse {
    pub external_subject_id: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProviderRegisterRequest {
    pub role: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub business_name: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub profile_pic: Option<String>,
    pub created_at: String,
}
