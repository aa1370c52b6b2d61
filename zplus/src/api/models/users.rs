//! API request/response models for users.

use crate::api::models::pagination::Pagination;
use crate::config::PasswordConfig;
use crate::db::models::users::UserDBResponse;
use crate::errors::{Error, Result};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Account role. Stored as TEXT.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Public view of an account. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
            full_name: db.full_name,
            phone: db.phone,
            avatar_url: db.avatar_url,
            is_active: db.is_active,
            email_verified: db.email_verified,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Admin request to create an account with an explicit role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl AdminUserCreate {
    pub fn validate(&self, password: &PasswordConfig) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password, password.min_length, password.max_length)?;
        validate_full_name(&self.full_name)?;
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub role: Option<Role>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Admin request to edit an account
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminUserUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Self-service profile edit
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(full_name) = &self.full_name {
            validate_full_name(full_name)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

impl AdminUserUpdate {
    pub fn validate(&self) -> Result<()> {
        ProfileUpdate {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            avatar_url: None,
        }
        .validate()
    }
}

/// The authenticated principal, decoded from a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&UserDBResponse> for CurrentUser {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username.clone(),
            email: db.email.clone(),
            role: db.role,
        }
    }
}

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest { message: message.into() }
}

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(bad_request("username must be between 3 and 50 characters"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && email.len() <= 255 => Ok(()),
        _ => Err(bad_request("email must be a valid email address")),
    }
}

pub fn validate_full_name(full_name: &str) -> Result<()> {
    if full_name.trim().is_empty() {
        return Err(bad_request("full_name is required"));
    }
    if full_name.chars().count() > 100 {
        return Err(bad_request("full_name must be at most 100 characters"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<()> {
    if phone.chars().count() > 20 {
        return Err(bad_request("phone must be at most 20 characters"));
    }
    Ok(())
}

pub fn validate_password(password: &str, min_length: usize, max_length: usize) -> Result<()> {
    let len = password.chars().count();
    if len < min_length {
        return Err(bad_request(format!("password must be at least {min_length} characters")));
    }
    if len > max_length {
        return Err(bad_request(format!("password must be at most {max_length} characters")));
    }
    Ok(())
}
