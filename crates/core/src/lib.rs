//! Core business logic for the Chantier budget ledger.
//!
//! This crate contains the domain rules with no web or database
//! dependencies. Persistence goes through the traits in [`repository`].
//!
//! # Modules
//!
//! - `division` - Division taxonomy and code classification
//! - `budget` - Budget lines, division rollups and variance
//! - `change_order` - Change orders and their approval workflow
//! - `project` - Project rollup and the persisted project service
//! - `repository` - Persistence traits and the in-memory store

pub mod budget;
pub mod change_order;
pub mod division;
mod error;
pub mod project;
pub mod repository;
