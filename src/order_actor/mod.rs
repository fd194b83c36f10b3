//! Order-specific domain logic: lifecycle rules and the settlement guard.

mod actions;
pub mod entity;
pub mod error;
pub mod transition;

pub use actions::*;
pub use error::*;
pub use transition::*;
