//! Business domain types. Pure data structures with no actor-specific concerns.

pub mod user;
pub mod product;
pub mod order;

pub use user::*;
pub use product::*;
pub use order::*;
