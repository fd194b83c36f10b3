//! Order lifecycle rules.
//!
//! All status rules live here so that every entry point (admin update, owner
//! cancel, payment proof) is checked against the same table. Planning is
//! pure: it never touches the ledger or the stored order.

use crate::domain::{Order, OrderStatus, PaymentStatus, StatusUpdate};
use super::error::OrderError;

/// Stock movement a transition requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEffect {
    None,
    /// Payment confirmed: turn reservations into permanent deductions.
    Commit,
    /// Payment failed or order cancelled: give reservations back.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub effect: LedgerEffect,
}

impl TransitionPlan {
    pub fn settles(&self) -> bool {
        self.effect != LedgerEffect::None
    }
}

fn check_payment(from: PaymentStatus, to: PaymentStatus) -> Result<(), OrderError> {
    use PaymentStatus::*;
    match (from, to) {
        (Paid, Failed) | (Paid, Pending) | (Paid, Submitted) => Err(OrderError::InvalidTransition(
            format!("payment cannot move from {} to {}", from, to),
        )),
        _ => Ok(()),
    }
}

fn check_order(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if from == to || !from.is_terminal() {
        return Ok(());
    }
    Err(OrderError::InvalidTransition(format!(
        "order cannot move from {} to {}",
        from, to
    )))
}

/// Stock outcome an order has been, or is asked to be, settled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Paid,
    Failed,
    Cancelled,
}

/// Whether a settled order already records `outcome`.
fn records(order: &Order, outcome: Outcome) -> bool {
    match outcome {
        Outcome::Paid => order.payment_status == PaymentStatus::Paid,
        Outcome::Failed => order.payment_status == PaymentStatus::Failed,
        Outcome::Cancelled => order.order_status == OrderStatus::Cancelled,
    }
}

fn requested_outcomes(update: &StatusUpdate) -> impl Iterator<Item = Outcome> {
    let payment = match update.payment_status {
        Some(PaymentStatus::Paid) => Some(Outcome::Paid),
        Some(PaymentStatus::Failed) => Some(Outcome::Failed),
        _ => None,
    };
    let order = (update.order_status == Some(OrderStatus::Cancelled)).then_some(Outcome::Cancelled);
    payment.into_iter().chain(order)
}

/// Guard for orders whose stock is already settled. Asking for a recorded
/// outcome again is `AlreadySettled`; confirming payment after a release has
/// nothing left to commit.
fn check_settled(order: &Order, update: &StatusUpdate) -> Result<(), OrderError> {
    if !order.stock_processed {
        return Ok(());
    }
    for requested in requested_outcomes(update) {
        if records(order, requested) {
            return Err(OrderError::AlreadySettled(order.id.clone()));
        }
        if requested == Outcome::Paid {
            return Err(OrderError::InvalidTransition(format!(
                "order {} has released its stock and cannot be paid",
                order.id
            )));
        }
    }
    Ok(())
}

/// Plans a privileged status change.
///
/// Rules, in order:
/// 1. an empty update is rejected;
/// 2. the requested statuses are checked against the transition table;
/// 3. a confirmed payment forces the order into `processing` unless it has
///    already shipped, and the resulting order status is checked again;
/// 4. once `stock_processed` is set, asking for the outcome already settled
///    is `AlreadySettled`, and any other change is applied without touching
///    the ledger;
/// 5. otherwise the new statuses decide the ledger effect.
pub fn plan_transition(order: &Order, update: StatusUpdate) -> Result<TransitionPlan, OrderError> {
    if update.payment_status.is_none() && update.order_status.is_none() {
        return Err(OrderError::Validation(
            "paymentStatus or orderStatus is required".to_string(),
        ));
    }

    let payment_status = update.payment_status.unwrap_or(order.payment_status);
    let mut order_status = update.order_status.unwrap_or(order.order_status);
    check_payment(order.payment_status, payment_status)?;
    check_order(order.order_status, order_status)?;

    check_settled(order, &update)?;

    let effect = if order.stock_processed {
        LedgerEffect::None
    } else if payment_status == PaymentStatus::Paid {
        let already_shipped = update.order_status.is_none()
            && matches!(order.order_status, OrderStatus::Shipped | OrderStatus::Delivered);
        if !already_shipped {
            order_status = OrderStatus::Processing;
            check_order(order.order_status, order_status)?;
        }
        LedgerEffect::Commit
    } else if payment_status == PaymentStatus::Failed || order_status == OrderStatus::Cancelled {
        LedgerEffect::Release
    } else {
        LedgerEffect::None
    };

    Ok(TransitionPlan {
        payment_status,
        order_status,
        effect,
    })
}

/// Owner edits of delivery details or payment method.
pub fn ensure_editable(order: &Order) -> Result<(), OrderError> {
    if order.payment_status == PaymentStatus::Pending && order.order_status == OrderStatus::Pending {
        return Ok(());
    }
    Err(OrderError::Locked(format!(
        "order {} can no longer be edited (payment {}, order {})",
        order.id, order.payment_status, order.order_status
    )))
}

/// Plans an owner-initiated cancellation.
pub fn plan_cancellation(order: &Order) -> Result<TransitionPlan, OrderError> {
    if order.payment_status == PaymentStatus::Paid
        || matches!(order.order_status, OrderStatus::Shipped | OrderStatus::Delivered)
    {
        return Err(OrderError::Locked(format!(
            "order {} can no longer be cancelled (payment {}, order {})",
            order.id, order.payment_status, order.order_status
        )));
    }
    plan_transition(order, StatusUpdate::order(OrderStatus::Cancelled))
}

/// Checks that a payment proof may be attached.
pub fn ensure_proof_accepted(order: &Order, proof_ref: &str) -> Result<(), OrderError> {
    if !order.payment_method.requires_proof() {
        return Err(OrderError::Validation(format!(
            "order {} is not paid by bank transfer",
            order.id
        )));
    }
    if proof_ref.trim().is_empty() {
        return Err(OrderError::Validation("proofRef is required".to_string()));
    }
    if order.payment_status != PaymentStatus::Pending || order.order_status == OrderStatus::Cancelled {
        return Err(OrderError::Locked(format!(
            "order {} no longer accepts a payment proof (payment {}, order {})",
            order.id, order.payment_status, order.order_status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryInfo, PaymentMethod};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(payment: PaymentStatus, status: OrderStatus, processed: bool) -> Order {
        Order {
            id: "order_1".to_string(),
            user_id: "user_1".to_string(),
            contact_email: "alice@example.com".to_string(),
            items: Vec::new(),
            total: Decimal::ZERO,
            delivery_info: DeliveryInfo {
                recipient: "Alice".to_string(),
                phone: "555".to_string(),
                address_line: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: None,
            },
            payment_method: PaymentMethod::BankTransfer,
            payment_proof: None,
            payment_status: payment,
            order_status: status,
            stock_processed: processed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fresh() -> Order {
        order(PaymentStatus::Pending, OrderStatus::Pending, false)
    }

    #[test]
    fn test_paid_commits_and_forces_processing() {
        let plan = plan_transition(
            &fresh(),
            StatusUpdate {
                payment_status: Some(PaymentStatus::Paid),
                order_status: Some(OrderStatus::Shipped),
            },
        )
        .unwrap();
        assert_eq!(plan.effect, LedgerEffect::Commit);
        assert_eq!(plan.order_status, OrderStatus::Processing);
    }

    #[test]
    fn test_paid_wins_over_cancel_in_same_request() {
        let plan = plan_transition(
            &fresh(),
            StatusUpdate {
                payment_status: Some(PaymentStatus::Paid),
                order_status: Some(OrderStatus::Cancelled),
            },
        )
        .unwrap();
        assert_eq!(plan.effect, LedgerEffect::Commit);
        assert_eq!(plan.order_status, OrderStatus::Processing);
    }

    #[test]
    fn test_failed_and_cancelled_release() {
        let failed = plan_transition(&fresh(), StatusUpdate::payment(PaymentStatus::Failed)).unwrap();
        assert_eq!(failed.effect, LedgerEffect::Release);
        assert_eq!(failed.order_status, OrderStatus::Pending);

        let cancelled = plan_transition(&fresh(), StatusUpdate::order(OrderStatus::Cancelled)).unwrap();
        assert_eq!(cancelled.effect, LedgerEffect::Release);
    }

    #[test]
    fn test_non_settling_update_has_no_effect() {
        let plan = plan_transition(&fresh(), StatusUpdate::payment(PaymentStatus::Submitted)).unwrap();
        assert!(!plan.settles());
    }

    #[test]
    fn test_illegal_transitions() {
        let paid = order(PaymentStatus::Paid, OrderStatus::Processing, true);
        let err = plan_transition(&paid, StatusUpdate::payment(PaymentStatus::Failed)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));

        let delivered = order(PaymentStatus::Paid, OrderStatus::Delivered, true);
        let err = plan_transition(&delivered, StatusUpdate::order(OrderStatus::Cancelled)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));

        let cancelled = order(PaymentStatus::Pending, OrderStatus::Cancelled, true);
        let err = plan_transition(&cancelled, StatusUpdate::order(OrderStatus::Processing)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));
    }

    #[test]
    fn test_settled_outcome_is_not_repeated() {
        let paid = order(PaymentStatus::Paid, OrderStatus::Processing, true);
        let err = plan_transition(&paid, StatusUpdate::payment(PaymentStatus::Paid)).unwrap_err();
        assert_eq!(err, OrderError::AlreadySettled("order_1".to_string()));

        let cancelled = order(PaymentStatus::Pending, OrderStatus::Cancelled, true);
        let err = plan_transition(&cancelled, StatusUpdate::order(OrderStatus::Cancelled)).unwrap_err();
        assert_eq!(err, OrderError::AlreadySettled("order_1".to_string()));

        let failed = order(PaymentStatus::Failed, OrderStatus::Pending, true);
        let err = plan_transition(&failed, StatusUpdate::payment(PaymentStatus::Failed)).unwrap_err();
        assert_eq!(err, OrderError::AlreadySettled("order_1".to_string()));
    }

    #[test]
    fn test_released_order_cannot_be_paid() {
        let failed = order(PaymentStatus::Failed, OrderStatus::Pending, true);
        let err = plan_transition(&failed, StatusUpdate::payment(PaymentStatus::Paid)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));

        let cancelled = order(PaymentStatus::Pending, OrderStatus::Cancelled, true);
        let err = plan_transition(&cancelled, StatusUpdate::payment(PaymentStatus::Paid)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));
    }

    #[test]
    fn test_cancel_after_other_settlement_skips_ledger() {
        let paid = order(PaymentStatus::Paid, OrderStatus::Processing, true);
        let plan = plan_transition(&paid, StatusUpdate::order(OrderStatus::Cancelled)).unwrap();
        assert_eq!(plan.order_status, OrderStatus::Cancelled);
        assert_eq!(plan.payment_status, PaymentStatus::Paid);
        assert_eq!(plan.effect, LedgerEffect::None);

        let failed = order(PaymentStatus::Failed, OrderStatus::Pending, true);
        let plan = plan_cancellation(&failed).unwrap();
        assert_eq!(plan.order_status, OrderStatus::Cancelled);
        assert_eq!(plan.effect, LedgerEffect::None);

        let both = order(PaymentStatus::Failed, OrderStatus::Cancelled, true);
        let err = plan_transition(&both, StatusUpdate::order(OrderStatus::Cancelled)).unwrap_err();
        assert_eq!(err, OrderError::AlreadySettled("order_1".to_string()));
    }

    #[test]
    fn test_shipping_after_settlement_is_allowed() {
        let paid = order(PaymentStatus::Paid, OrderStatus::Processing, true);
        let plan = plan_transition(&paid, StatusUpdate::order(OrderStatus::Shipped)).unwrap();
        assert_eq!(plan.order_status, OrderStatus::Shipped);
        assert_eq!(plan.payment_status, PaymentStatus::Paid);
        assert!(!plan.settles());
    }

    #[test]
    fn test_cash_on_delivery_paid_after_shipping_keeps_status() {
        let shipped = order(PaymentStatus::Pending, OrderStatus::Shipped, false);
        let plan = plan_transition(&shipped, StatusUpdate::payment(PaymentStatus::Paid)).unwrap();
        assert_eq!(plan.effect, LedgerEffect::Commit);
        assert_eq!(plan.order_status, OrderStatus::Shipped);
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let err = plan_transition(&fresh(), StatusUpdate::default()).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_owner_rules() {
        assert!(ensure_editable(&fresh()).is_ok());
        let submitted = order(PaymentStatus::Submitted, OrderStatus::Pending, false);
        assert!(matches!(ensure_editable(&submitted), Err(OrderError::Locked(_))));

        assert!(plan_cancellation(&submitted).is_ok());
        let paid = order(PaymentStatus::Paid, OrderStatus::Processing, true);
        assert!(matches!(plan_cancellation(&paid), Err(OrderError::Locked(_))));
        let shipped = order(PaymentStatus::Pending, OrderStatus::Shipped, false);
        assert!(matches!(plan_cancellation(&shipped), Err(OrderError::Locked(_))));
    }

    #[test]
    fn test_proof_rules() {
        assert!(ensure_proof_accepted(&fresh(), "receipts/1.png").is_ok());
        assert!(matches!(ensure_proof_accepted(&fresh(), " "), Err(OrderError::Validation(_))));

        let mut cod = fresh();
        cod.payment_method = PaymentMethod::CashOnDelivery;
        assert!(matches!(ensure_proof_accepted(&cod, "r"), Err(OrderError::Validation(_))));

        let submitted = order(PaymentStatus::Submitted, OrderStatus::Pending, false);
        assert!(matches!(ensure_proof_accepted(&submitted, "r"), Err(OrderError::Locked(_))));
    }
}
