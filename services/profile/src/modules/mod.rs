//! Business logic

pub mod user;

pub use user::{UserModule, UserModuleError};
