//! User model and the results returned by the user module

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Store-assigned user identifier. `0` means "not persisted".
pub type UserId = i64;

/// User entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub phone_number: String,
    /// Password hash as stored in the `password` column
    #[serde(skip)]
    #[sqlx(rename = "password")]
    pub hashed_password: String,
    /// Plain password taken from the request; never persisted
    #[serde(skip)]
    #[sqlx(skip)]
    pub plain_password: String,
    pub login_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build an unpersisted user from registration input
    pub fn new(
        full_name: impl Into<String>,
        phone_number: impl Into<String>,
        plain_password: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            phone_number: phone_number.into(),
            plain_password: plain_password.into(),
            ..Self::default()
        }
    }

    pub fn exists(&self) -> bool {
        self.id != 0
    }
}

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResult {
    pub user: User,
    pub valid: bool,
    /// Every violated validation rule; empty when `valid` is true
    pub messages: Vec<String>,
}

/// Outcome of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub user: User,
    pub token: String,
}

/// Outcome of a profile update
///
/// `conflict` means nothing was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdateResult {
    pub conflict: bool,
    pub message: String,
}

impl ProfileUpdateResult {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            conflict: true,
            message: message.into(),
        }
    }
}
