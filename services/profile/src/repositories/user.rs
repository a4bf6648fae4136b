//! PostgreSQL user store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{StoreError, UserStore};
use crate::models::{User, UserId};

const UNIQUE_VIOLATION: &str = "23505";

/// User store backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                StoreError::PhoneNumberTaken
            }
            other => StoreError::Database(other),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_phone_number(&self, phone_number: &str) -> Result<User, StoreError> {
        debug!("Finding user by phone number");

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, phone_number, password, login_count, created_at, updated_at
            FROM users
            WHERE phone_number = $1
            "#,
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<User, StoreError> {
        debug!(user_id = id, "Finding user by ID");

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, phone_number, password, login_count, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<UserId, StoreError> {
        if user.hashed_password.is_empty() {
            return Err(StoreError::Internal(
                "refusing to insert a user without a password hash".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let id: UserId = sqlx::query_scalar(
            r#"
            INSERT INTO users (full_name, phone_number, password)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.hashed_password)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id = id, "Created new user");
        Ok(id)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET phone_number = $1,
                full_name = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&user.phone_number)
        .bind(&user.full_name)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        info!(user_id = user.id, "Updated user profile");
        Ok(())
    }

    async fn increment_login_count(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET login_count = login_count + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
