use chrono::Utc;
use rust_decimal::Decimal;
use crate::actor_framework::Entity;
use crate::domain::{DeliveryInfo, Order, OrderCreate, OrderEdit, OrderStatus, PaymentStatus};
use super::actions::{OrderAction, OrderActionResult};
use super::error::OrderError;
use super::transition::{ensure_editable, ensure_proof_accepted};

fn validate_delivery(info: &DeliveryInfo) -> Result<(), OrderError> {
    let missing = info.missing_fields();
    if missing.is_empty() {
        return Ok(());
    }
    Err(OrderError::Validation(format!(
        "deliveryInfo is missing: {}",
        missing.join(", ")
    )))
}

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Update = OrderEdit;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderError;

    /// Creates a new Order in `(pending, pending)` with the settlement guard unset.
    ///
    /// The total is computed from the unit prices snapshotted into the items.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        if params.items.is_empty() {
            return Err(OrderError::Validation("order has no items".to_string()));
        }
        if let Some(item) = params.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::Validation(format!(
                "item {} has zero quantity",
                item.key()
            )));
        }
        validate_delivery(&params.delivery_info)?;

        let total = params
            .items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum::<Decimal>();
        let now = Utc::now();
        Ok(Self {
            id,
            user_id: params.user_id,
            contact_email: params.contact_email,
            items: params.items,
            total,
            delivery_info: params.delivery_info,
            payment_method: params.payment_method,
            payment_proof: None,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            stock_processed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an owner edit; only allowed while the order is `(pending, pending)`.
    fn on_update(&mut self, edit: OrderEdit) -> Result<(), OrderError> {
        ensure_editable(self)?;
        if edit.delivery_info.is_none() && edit.payment_method.is_none() {
            return Err(OrderError::Validation(
                "deliveryInfo or paymentMethod is required".to_string(),
            ));
        }
        if let Some(info) = edit.delivery_info {
            validate_delivery(&info)?;
            self.delivery_info = info;
        }
        if let Some(method) = edit.payment_method {
            self.payment_method = method;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::ApplyTransition(plan) => {
                if plan.settles() {
                    if self.stock_processed {
                        return Err(OrderError::AlreadySettled(self.id.clone()));
                    }
                    self.stock_processed = true;
                }
                self.payment_status = plan.payment_status;
                self.order_status = plan.order_status;
                self.updated_at = Utc::now();
                Ok(OrderActionResult::ApplyTransition(self.clone()))
            }
            OrderAction::AttachPaymentProof { proof_ref } => {
                ensure_proof_accepted(self, &proof_ref)?;
                self.payment_proof = Some(proof_ref);
                self.payment_status = PaymentStatus::Submitted;
                self.updated_at = Utc::now();
                Ok(OrderActionResult::AttachPaymentProof(self.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderItem, PaymentMethod};
    use crate::order_actor::transition::{LedgerEffect, TransitionPlan};

    fn delivery() -> DeliveryInfo {
        DeliveryInfo {
            recipient: "Alice".to_string(),
            phone: "555-0100".to_string(),
            address_line: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: None,
        }
    }

    fn create() -> OrderCreate {
        OrderCreate {
            user_id: "user_1".to_string(),
            contact_email: "alice@example.com".to_string(),
            items: vec![
                OrderItem {
                    product_id: "product_1".to_string(),
                    variant_id: None,
                    product_name: "Mug".to_string(),
                    unit_price: Decimal::new(1250, 2),
                    quantity: 2,
                },
                OrderItem {
                    product_id: "product_2".to_string(),
                    variant_id: Some("product_2_v1".to_string()),
                    product_name: "Shirt (Large)".to_string(),
                    unit_price: Decimal::new(25, 0),
                    quantity: 1,
                },
            ],
            delivery_info: delivery(),
            payment_method: PaymentMethod::BankTransfer,
        }
    }

    #[test]
    fn test_create_snapshots_total() {
        let order = Order::from_create_params("order_1".to_string(), create()).unwrap();
        assert_eq!(order.total, Decimal::new(50, 0));
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert!(!order.stock_processed);
    }

    #[test]
    fn test_create_rejects_blank_delivery_fields() {
        let mut params = create();
        params.delivery_info.city = "  ".to_string();
        let err = Order::from_create_params("order_1".to_string(), params).unwrap_err();
        assert_eq!(err, OrderError::Validation("deliveryInfo is missing: city".to_string()));
    }

    #[test]
    fn test_settling_twice_is_rejected() {
        let mut order = Order::from_create_params("order_1".to_string(), create()).unwrap();
        let plan = TransitionPlan {
            payment_status: PaymentStatus::Paid,
            order_status: OrderStatus::Processing,
            effect: LedgerEffect::Commit,
        };
        order.handle_action(OrderAction::ApplyTransition(plan)).unwrap();
        assert!(order.stock_processed);

        let err = order.handle_action(OrderAction::ApplyTransition(plan)).unwrap_err();
        assert_eq!(err, OrderError::AlreadySettled("order_1".to_string()));
    }

    #[test]
    fn test_edit_only_while_pending() {
        let mut order = Order::from_create_params("order_1".to_string(), create()).unwrap();
        let edit = OrderEdit {
            delivery_info: None,
            payment_method: Some(PaymentMethod::CashOnDelivery),
        };
        order.on_update(edit.clone()).unwrap();
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);

        order.payment_status = PaymentStatus::Submitted;
        assert!(matches!(order.on_update(edit), Err(OrderError::Locked(_))));
    }
}
