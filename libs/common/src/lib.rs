//! Shared infrastructure for the profile service
//!
//! Connection pooling, configuration and error types for the PostgreSQL
//! database live here so that binaries only wire them together.

pub mod database;
pub mod error;
