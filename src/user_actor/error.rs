use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("Cart line not found: {0}")]
    CartLineNotFound(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("User validation error: {0}")]
    Validation(String),
}
