//! Shared utilities, configuration, and error handling for Telecare
//!
//! This crate provides common functionality used across the Telecare services:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Validating JSON extractor for request bodies
//! - State machine and repository error types

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
