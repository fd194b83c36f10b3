use tracing::{error, info, instrument, warn};
use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{CartLine, Checkout, Order, OrderCreate, OrderEdit, OrderItem, StatusUpdate};
use crate::error::CommerceError;
use crate::keyed_lock::KeyedLocks;
use crate::ledger::{Settlement, StockLedger};
use crate::notify::{Notification, Notifier};
use crate::order_actor::{
    plan_cancellation, plan_transition, LedgerEffect, OrderAction, OrderActionResult, OrderError, TransitionPlan,
};
use super::{CartClient, ProductClient, UserClient};

/// Client for interacting with the Order actor.
///
/// This client orchestrates the order lifecycle across actors: it snapshots
/// the cart at checkout, runs every status change through the transition
/// table, moves stock in the ledger and only then persists the order.
/// Each order id is locked for the whole sequence, so two concurrent
/// updates can never both pass the settlement guard.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    user_client: UserClient,
    product_client: ProductClient,
    cart_client: CartClient,
    ledger: StockLedger,
    locks: KeyedLocks<String>,
    notifier: Notifier,
}

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        user_client: UserClient,
        product_client: ProductClient,
        cart_client: CartClient,
        ledger: StockLedger,
        notifier: Notifier,
    ) -> Self {
        Self {
            inner,
            user_client,
            product_client,
            cart_client,
            ledger,
            locks: KeyedLocks::new(),
            notifier,
        }
    }

    /// Turns the user's cart into a `(pending, pending)` order.
    ///
    /// The cart's reservations carry over to the order. If the order cannot
    /// be created the lines go back into the cart.
    #[instrument(skip(self, checkout))]
    pub async fn create_order(&self, user_id: String, checkout: Checkout) -> Result<Order, CommerceError> {
        info!("Processing create_order request (Client Side)");
        let _cart_guard = self.cart_client.locks().lock(user_id.clone()).await;

        let user = self.user_client.require_user(user_id.clone()).await?;
        if user.cart.is_empty() {
            return Err(CommerceError::ValidationError("cart is empty".to_string()));
        }
        let items = self.snapshot(&user.cart).await?;
        let lines = self.user_client.take_cart(user_id.clone()).await?;

        let params = OrderCreate {
            user_id: user_id.clone(),
            contact_email: user.email,
            items,
            delivery_info: checkout.delivery_info,
            payment_method: checkout.payment_method,
        };
        let order_id = match self.inner.create(params).await {
            Ok(id) => id,
            Err(e) => {
                let cause = CommerceError::from(e);
                if cause.is_indeterminate() {
                    error!(error = %cause, "Order creation outcome unknown, cart left empty");
                    return Err(cause);
                }
                warn!(error = %cause, "Order creation failed, restoring cart");
                if let Err(restore) = self.user_client.restore_cart(user_id, lines).await {
                    error!(error = %restore, "Cart restore failed");
                    return Err(CommerceError::Indeterminate(format!(
                        "{} (cart restore failed: {})",
                        cause, restore
                    )));
                }
                return Err(cause);
            }
        };

        let order = self.require_order(order_id).await?;
        info!(order_id = %order.id, total = %order.total, "Order created");
        self.notifier.dispatch(Notification {
            to: order.contact_email.clone(),
            subject: format!("Order {} received", order.id),
            body: format!("We received your order. Total: {}.", order.total),
        });
        Ok(order)
    }

    /// Reads an order on behalf of its owner.
    #[instrument(skip(self))]
    pub async fn get_order_for(&self, order_id: String, user_id: &str) -> Result<Order, CommerceError> {
        let order = self.require_order(order_id).await?;
        owned_by(order, user_id)
    }

    /// Privileged status change (admin or payment webhook).
    #[instrument(skip(self))]
    pub async fn update_status(&self, order_id: String, update: StatusUpdate) -> Result<Order, CommerceError> {
        let _guard = self.locks.lock(order_id.clone()).await;
        let order = self.require_order(order_id).await?;

        let plan = plan_transition(&order, update).map_err(|e| {
            warn!(error = %e, "Status update rejected");
            CommerceError::from(e)
        })?;
        let updated = self.settle(&order, plan).await?;
        info!(
            order_id = %updated.id,
            payment_status = %updated.payment_status,
            order_status = %updated.order_status,
            stock_processed = updated.stock_processed,
            "Order status updated"
        );
        self.notifier.dispatch(Notification {
            to: updated.contact_email.clone(),
            subject: format!("Order {} update", updated.id),
            body: format!(
                "Payment: {}. Order: {}.",
                updated.payment_status, updated.order_status
            ),
        });
        Ok(updated)
    }

    /// Owner edit of delivery details or payment method.
    #[instrument(skip(self, edit))]
    pub async fn edit_order(&self, order_id: String, user_id: &str, edit: OrderEdit) -> Result<Order, CommerceError> {
        let _guard = self.locks.lock(order_id.clone()).await;
        let order = self.require_order(order_id.clone()).await?;
        owned_by(order, user_id)?;

        let updated = self.inner.update(order_id, edit).await?;
        info!(order_id = %updated.id, "Order details edited");
        Ok(updated)
    }

    /// Owner cancellation: releases the reservations and notifies the customer.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: String, user_id: &str) -> Result<Order, CommerceError> {
        let _guard = self.locks.lock(order_id.clone()).await;
        let order = self.require_order(order_id).await?;
        let order = owned_by(order, user_id)?;

        let plan = plan_cancellation(&order)?;
        let cancelled = self.settle(&order, plan).await?;
        info!(order_id = %cancelled.id, "Order cancelled by owner");
        self.notifier.dispatch(Notification {
            to: cancelled.contact_email.clone(),
            subject: format!("Order {} cancelled", cancelled.id),
            body: "Your order has been cancelled.".to_string(),
        });
        Ok(cancelled)
    }

    /// Attaches a bank-transfer receipt and moves payment to `submitted`.
    #[instrument(skip(self))]
    pub async fn submit_payment_proof(&self, order_id: String, user_id: &str, proof_ref: String) -> Result<Order, CommerceError> {
        let _guard = self.locks.lock(order_id.clone()).await;
        let order = self.require_order(order_id.clone()).await?;
        owned_by(order, user_id)?;

        let updated = match self
            .inner
            .perform_action(order_id, OrderAction::AttachPaymentProof { proof_ref })
            .await?
        {
            OrderActionResult::AttachPaymentProof(order) => order,
            other => return Err(unexpected(other)),
        };
        info!(order_id = %updated.id, "Payment proof attached");
        self.notifier.dispatch(Notification {
            to: updated.contact_email.clone(),
            subject: format!("Order {} payment proof received", updated.id),
            body: "We will confirm your payment shortly.".to_string(),
        });
        Ok(updated)
    }

    async fn snapshot(&self, lines: &[CartLine]) -> Result<Vec<OrderItem>, CommerceError> {
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self
                .product_client
                .require_product(line.key.product_id.clone())
                .await?;
            let (product_name, unit_price) = product
                .listing(line.key.variant_id.as_deref())
                .ok_or_else(|| CommerceError::NotFound(format!("variant {}", line.key)))?;
            items.push(OrderItem {
                product_id: line.key.product_id.clone(),
                variant_id: line.key.variant_id.clone(),
                product_name,
                unit_price,
                quantity: line.quantity,
            });
        }
        Ok(items)
    }

    /// Runs the planned ledger movement, then persists the new statuses.
    ///
    /// The caller holds the order lock. A ledger failure leaves the order
    /// untouched; a persist failure reverts the ledger movement.
    async fn settle(&self, order: &Order, plan: TransitionPlan) -> Result<Order, CommerceError> {
        let settlement = match plan.effect {
            LedgerEffect::None => None,
            LedgerEffect::Commit => Some(self.ledger.commit_all(&order.items).await?),
            LedgerEffect::Release => Some(self.ledger.release_all(&order.items).await?),
        };

        match self
            .inner
            .perform_action(order.id.clone(), OrderAction::ApplyTransition(plan))
            .await
        {
            Ok(OrderActionResult::ApplyTransition(updated)) => Ok(updated),
            Ok(other) => Err(unexpected(other)),
            Err(e) => {
                let cause = CommerceError::from(e);
                match settlement {
                    Some(settlement) => self.revert(order, plan, &settlement, cause).await,
                    None => Err(cause),
                }
            }
        }
    }

    async fn revert(
        &self,
        order: &Order,
        plan: TransitionPlan,
        settlement: &Settlement,
        cause: CommerceError,
    ) -> Result<Order, CommerceError> {
        if cause.is_indeterminate() {
            error!(order_id = %order.id, error = %cause, "Order save outcome unknown after stock moved");
            return Err(cause);
        }
        warn!(order_id = %order.id, error = %cause, "Order save failed, reverting stock movement");
        let committed = plan.effect == LedgerEffect::Commit;
        if let Err(e) = self.ledger.revert(&order.items, committed, settlement).await {
            error!(order_id = %order.id, error = %e, "Stock revert failed");
            return Err(CommerceError::Indeterminate(format!(
                "{} (stock revert failed: {})",
                cause, e
            )));
        }
        Err(cause)
    }
}

crate::impl_client_methods!(OrderClient, Order, order);

fn owned_by(order: Order, user_id: &str) -> Result<Order, CommerceError> {
    if order.user_id == user_id {
        return Ok(order);
    }
    Err(CommerceError::NotFound(format!("order {}", order.id)))
}

fn unexpected(result: OrderActionResult) -> CommerceError {
    FrameworkError::<OrderError>::UnexpectedResult(format!("{:?}", result)).into()
}
