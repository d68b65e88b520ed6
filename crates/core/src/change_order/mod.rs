//! Change orders and their approval workflow.

pub mod error;
pub mod register;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod register_props;

pub use error::ChangeOrderError;
pub use register::ChangeOrderRegister;
pub use types::{
    ChangeOrder, ChangeOrderPatch, ChangeOrderStatus, ChangeOrderType, NewChangeOrder, Numbering,
};
pub use workflow::{ChangeOrderWorkflow, Transition};
