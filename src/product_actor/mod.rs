//! Product-specific domain logic, including the stock ledger actions.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
