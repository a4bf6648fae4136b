//! In-memory user store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{StoreError, UserStore};
use crate::models::{User, UserId};

#[derive(Default)]
struct Users {
    next_id: UserId,
    by_id: HashMap<UserId, User>,
}

/// User store keeping everything in process memory
///
/// Enforces the same unique phone number constraint as the `users` table.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Users>,
}

impl InMemoryUserStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> StoreError {
        StoreError::Internal("Failed to acquire lock".to_string())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_phone_number(&self, phone_number: &str) -> Result<User, StoreError> {
        let users = self.users.read().map_err(Self::poisoned)?;

        users
            .by_id
            .values()
            .find(|user| user.phone_number == phone_number)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let users = self.users.read().map_err(Self::poisoned)?;

        users.by_id.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: &User) -> Result<UserId, StoreError> {
        if user.hashed_password.is_empty() {
            return Err(StoreError::Internal(
                "refusing to insert a user without a password hash".to_string(),
            ));
        }

        let mut users = self.users.write().map_err(Self::poisoned)?;

        if users
            .by_id
            .values()
            .any(|existing| existing.phone_number == user.phone_number)
        {
            return Err(StoreError::PhoneNumberTaken);
        }

        users.next_id += 1;
        let id = users.next_id;
        let now = Utc::now();

        let stored = User {
            id,
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
            hashed_password: user.hashed_password.clone(),
            plain_password: String::new(),
            login_count: 0,
            created_at: Some(now),
            updated_at: Some(now),
        };
        users.by_id.insert(id, stored);

        Ok(id)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(Self::poisoned)?;

        if users
            .by_id
            .values()
            .any(|existing| existing.id != user.id && existing.phone_number == user.phone_number)
        {
            return Err(StoreError::PhoneNumberTaken);
        }

        let stored = users.by_id.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        stored.phone_number = user.phone_number.clone();
        stored.full_name = user.full_name.clone();
        stored.updated_at = Some(Utc::now());

        Ok(())
    }

    async fn increment_login_count(&self, id: UserId) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(Self::poisoned)?;

        let stored = users.by_id.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.login_count += 1;

        Ok(())
    }
}
