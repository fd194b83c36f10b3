//! HTTP surface of the order API.

pub mod problem;
pub mod router;

pub use router::{app_router, AppState};
