//! `SeaORM` entity definitions.

pub mod budget_lines;
pub mod change_order_sequences;
pub mod change_orders;
