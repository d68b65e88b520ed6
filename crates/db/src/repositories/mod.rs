//! Repository implementations over `SeaORM`.
//!
//! The persistence traits live in the core crate; this module provides the
//! PostgreSQL backend the service runs against in production.

pub mod ledger;

pub use ledger::PgRepository;
