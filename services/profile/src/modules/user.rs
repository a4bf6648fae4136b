//! User registration, login and profile management
//!
//! This is the only place that knows the business rules; hashing, tokens and
//! persistence are reached through their traits.

use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    hashing::{CredentialHasher, HashError},
    jwt::TokenIssuer,
    models::{LoginResult, ProfileUpdateResult, RegistrationResult, User, UserId},
    repositories::{StoreError, UserStore},
    validation::Validator,
};

pub const PHONE_NUMBER_CONFLICT: &str = "phone number already exist";

#[derive(Error, Debug)]
pub enum UserModuleError {
    /// Returned for every login failure regardless of cause
    #[error("phone number or password is not correct")]
    LoginFailed,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Orchestrates validation, hashing, token issuance and persistence
#[derive(Clone)]
pub struct UserModule {
    validator: Arc<dyn Validator>,
    hasher: Arc<dyn CredentialHasher>,
    token_issuer: Arc<dyn TokenIssuer>,
    store: Arc<dyn UserStore>,
}

impl UserModule {
    pub fn new(
        validator: Arc<dyn Validator>,
        hasher: Arc<dyn CredentialHasher>,
        token_issuer: Arc<dyn TokenIssuer>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            validator,
            hasher,
            token_issuer,
            store,
        }
    }

    /// Register a new user after validating every field
    ///
    /// Invalid input is reported through the result, not as an error, and
    /// leaves hasher and store untouched.
    pub async fn register(&self, mut user: User) -> Result<RegistrationResult, UserModuleError> {
        let messages: Vec<String> = [
            self.validator.validate_phone_number(&user.phone_number),
            self.validator.validate_full_name(&user.full_name),
            self.validator.validate_password(&user.plain_password),
        ]
        .into_iter()
        .flat_map(|validation| validation.messages)
        .collect();

        if !messages.is_empty() {
            debug!(violations = messages.len(), "Registration rejected by validation");
            return Ok(RegistrationResult {
                user,
                valid: false,
                messages,
            });
        }

        user.hashed_password = self.hash(&user.plain_password).await?;
        user.id = self.store.insert(&user).await?;

        info!(user_id = user.id, "Registered new user");
        Ok(RegistrationResult {
            user,
            valid: true,
            messages: Vec::new(),
        })
    }

    /// Authenticate by phone number and password, issue a token and count
    /// the login
    pub async fn login(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<LoginResult, UserModuleError> {
        let mut user = self
            .store
            .get_by_phone_number(phone_number)
            .await
            .map_err(|e| login_failed("lookup", &e))?;

        if !user.exists() {
            return Err(login_failed("lookup", &"record does not exist"));
        }

        let hasher = Arc::clone(&self.hasher);
        let (hash, plain) = (user.hashed_password.clone(), password.to_owned());
        tokio::task::spawn_blocking(move || hasher.compare_password(&hash, &plain))
            .await
            .map_err(|e| login_failed("password check", &e))?
            .map_err(|e| login_failed("password check", &e))?;

        let token = self
            .token_issuer
            .generate(&json!({ "id": user.id }))
            .map_err(|e| login_failed("token generation", &e))?;

        self.store
            .increment_login_count(user.id)
            .await
            .map_err(|e| login_failed("login count", &e))?;
        user.login_count += 1;

        info!(user_id = user.id, "User logged in");
        Ok(LoginResult { user, token })
    }

    pub async fn get_profile(&self, id: UserId) -> Result<User, UserModuleError> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Apply the non-empty fields of `changes` to the stored user
    ///
    /// An empty field leaves the stored value as it is. A phone number owned
    /// by another user is reported as a conflict and nothing is written.
    pub async fn update_profile(
        &self,
        changes: &User,
    ) -> Result<ProfileUpdateResult, UserModuleError> {
        let mut current = match self.store.get_by_id(changes.id).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(UserModuleError::UserNotFound),
            Err(e) => return Err(e.into()),
        };

        if !current.exists() {
            return Err(UserModuleError::UserNotFound);
        }

        if !changes.full_name.is_empty() {
            current.full_name = changes.full_name.clone();
        }

        if !changes.phone_number.is_empty() && changes.phone_number != current.phone_number {
            if self
                .is_phone_number_taken(current.id, &changes.phone_number)
                .await?
            {
                info!(user_id = current.id, "Phone number change rejected");
                return Ok(ProfileUpdateResult::conflict(PHONE_NUMBER_CONFLICT));
            }
            current.phone_number = changes.phone_number.clone();
        }

        match self.store.update(&current).await {
            Ok(()) => Ok(ProfileUpdateResult::default()),
            // Lost the race against a concurrent writer
            Err(StoreError::PhoneNumberTaken) => {
                Ok(ProfileUpdateResult::conflict(PHONE_NUMBER_CONFLICT))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn is_phone_number_taken(
        &self,
        user_id: UserId,
        phone_number: &str,
    ) -> Result<bool, UserModuleError> {
        match self.store.get_by_phone_number(phone_number).await {
            Ok(owner) => Ok(owner.exists() && owner.id != user_id),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs the hasher on the blocking pool
    async fn hash(&self, plain: &str) -> Result<String, UserModuleError> {
        let hasher = Arc::clone(&self.hasher);
        let plain = plain.to_owned();
        let hash = tokio::task::spawn_blocking(move || hasher.hash_password(&plain)).await??;
        Ok(hash)
    }
}

fn login_failed(stage: &str, cause: &dyn std::fmt::Display) -> UserModuleError {
    warn!(stage, cause = %cause, "Login failed");
    UserModuleError::LoginFailed
}
