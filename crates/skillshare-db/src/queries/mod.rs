//! Query functions, one module per table.

pub mod notes;
pub mod plans;
pub mod users;
