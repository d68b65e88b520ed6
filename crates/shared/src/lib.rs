//! Shared types, errors, and configuration for Chantier.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for projects, budget lines and change orders
//! - `MoneyRollup`, the single reducer behind every money total
//! - The federal/provincial tax calculator
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
