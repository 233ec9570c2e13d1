//! Shared types, errors, and configuration for Facture.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding helpers with decimal precision
//! - Application-wide error types
//! - JWT claims and token validation
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
