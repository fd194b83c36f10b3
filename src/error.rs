//! Request-boundary error taxonomy.
//!
//! Every client operation returns [`CommerceError`]. Entity errors and
//! framework failures convert into it so handlers can map a single type onto
//! a stable machine-readable code.

use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommerceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Already settled: {0}")]
    AlreadySettled(String),
    #[error("Order locked: {0}")]
    OrderLocked(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// The request never reached the store; nothing was mutated.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The store may or may not have applied the request.
    #[error("Outcome unknown: {0}")]
    Indeterminate(String),
}

impl CommerceError {
    /// Stable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CommerceError::NotFound(_) => "NOT_FOUND",
            CommerceError::InvalidTransition(_) => "INVALID_TRANSITION",
            CommerceError::AlreadySettled(_) => "ALREADY_SETTLED",
            CommerceError::OrderLocked(_) => "ORDER_LOCKED",
            CommerceError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CommerceError::ValidationError(_) => "VALIDATION_ERROR",
            CommerceError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            CommerceError::Indeterminate(_) => "OUTCOME_UNKNOWN",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            CommerceError::ValidationError(_) => 400,
            CommerceError::NotFound(_) => 404,
            CommerceError::AlreadySettled(_) | CommerceError::InsufficientStock { .. } => 409,
            CommerceError::InvalidTransition(_) => 422,
            CommerceError::OrderLocked(_) => 423,
            CommerceError::Indeterminate(_) => 500,
            CommerceError::Unavailable(_) => 503,
        }
    }

    /// Only failures that provably mutated nothing may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommerceError::Unavailable(_))
    }

    /// The failed call may have been applied, so it must not be compensated.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, CommerceError::Indeterminate(_))
    }
}

impl<E> From<FrameworkError<E>> for CommerceError
where
    E: Into<CommerceError>,
{
    fn from(e: FrameworkError<E>) -> Self {
        match e {
            FrameworkError::NotFound(id) => CommerceError::NotFound(id),
            FrameworkError::ActorClosed => CommerceError::Unavailable("actor closed".to_string()),
            FrameworkError::ActorDropped => {
                CommerceError::Indeterminate("actor dropped the response".to_string())
            }
            FrameworkError::UnexpectedResult(detail) => CommerceError::Indeterminate(detail),
            FrameworkError::Entity(inner) => inner.into(),
        }
    }
}

impl From<ProductError> for CommerceError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::VariantNotFound { .. } => CommerceError::NotFound(e.to_string()),
            ProductError::InsufficientStock { requested, available } => {
                CommerceError::InsufficientStock { requested, available }
            }
            ProductError::Validation(_) => CommerceError::ValidationError(e.to_string()),
        }
    }
}

impl From<UserError> for CommerceError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::CartLineNotFound(_) => CommerceError::NotFound(e.to_string()),
            UserError::InvalidQuantity(_) | UserError::Validation(_) => {
                CommerceError::ValidationError(e.to_string())
            }
        }
    }
}

impl From<OrderError> for CommerceError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidTransition(_) => CommerceError::InvalidTransition(e.to_string()),
            OrderError::AlreadySettled(_) => CommerceError::AlreadySettled(e.to_string()),
            OrderError::Locked(_) => CommerceError::OrderLocked(e.to_string()),
            OrderError::Validation(_) => CommerceError::ValidationError(e.to_string()),
        }
    }
}
