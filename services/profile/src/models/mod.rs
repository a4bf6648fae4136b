//! Profile service models

pub mod user;

pub use user::{LoginResult, ProfileUpdateResult, RegistrationResult, User, UserId};
