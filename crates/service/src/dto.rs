//! Transfer shapes exchanged with the boundary layer.
//!
//! Association members are id-only on the way in; display fields are filled
//! on the way out by the detail translations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDto {
    pub id: Option<i64>,
    #[serde(default)]
    pub authority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub img_url: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<CategoryDto>,
}

/// Outbound/update user shape; deliberately has no password field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<RoleDto>,
}

/// Insert-only user shape; carries the plaintext exactly once, for hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInsertDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<RoleDto>,
    pub password: String,
}

impl UserInsertDto {
    /// The scalar/role part of the insert payload, for the shared apply path.
    pub fn as_update(&self) -> UserDto {
        UserDto {
            id: None,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}
