//! Persistence contract for users and its implementations

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{User, UserId};

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::PgUserStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    /// Another user already owns the phone number
    #[error("phone number already exist")]
    PhoneNumberTaken,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("user store error: {0}")]
    Internal(String),
}

/// Users persistence
///
/// Every write commits or rolls back as a unit. Lookups report a missing user
/// as [`StoreError::NotFound`] rather than an empty success.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_phone_number(&self, phone_number: &str) -> Result<User, StoreError>;

    async fn get_by_id(&self, id: UserId) -> Result<User, StoreError>;

    /// Persist a new user and return its identifier. Only the hashed
    /// password is written.
    async fn insert(&self, user: &User) -> Result<UserId, StoreError>;

    /// Write phone number and full name of an existing user
    async fn update(&self, user: &User) -> Result<(), StoreError>;

    async fn increment_login_count(&self, id: UserId) -> Result<(), StoreError>;
}
