//! Identity and profile service
//!
//! Registers users, authenticates them with phone number and password, issues
//! RS256 bearer tokens and lets users edit their profile.

pub mod config;
pub mod error;
pub mod hashing;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod modules;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;
