//! Division taxonomy used to classify budget lines and change orders.

pub mod error;
pub mod taxonomy;

pub use error::DivisionError;
pub use taxonomy::{Division, DivisionTaxonomy};
