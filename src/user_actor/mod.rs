//! User-specific domain logic: profile and the reservation-backed cart.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
