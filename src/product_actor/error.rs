use thiserror::Error;

/// Errors raised by product actions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Variant {variant_id} not found on product {product_id}")]
    VariantNotFound { product_id: String, variant_id: String },
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Product validation error: {0}")]
    Validation(String),
}
