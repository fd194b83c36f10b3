use crate::domain::Order;
use super::transition::TransitionPlan;

/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Writes a planned status change. A settling plan also trips `stock_processed`.
    ApplyTransition(TransitionPlan),
    /// Records a bank-transfer receipt and moves payment to `submitted`.
    AttachPaymentProof { proof_ref: String },
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    ApplyTransition(Order),
    AttachPaymentProof(Order),
}
