use tracing::{error, info, instrument, warn};
use crate::domain::{CartLine, StockKey};
use crate::error::CommerceError;
use crate::keyed_lock::KeyedLocks;
use crate::ledger::StockLedger;
use super::UserClient;

/// Cart reservation manager.
///
/// Keeps every cart row backed by an equal reservation in the stock ledger.
/// Mutations for one user run under that user's lock; checkout takes the
/// same lock through [`CartClient::locks`].
#[derive(Clone)]
pub struct CartClient {
    users: UserClient,
    ledger: StockLedger,
    locks: KeyedLocks<String>,
}

impl CartClient {
    pub fn new(users: UserClient, ledger: StockLedger) -> Self {
        Self {
            users,
            ledger,
            locks: KeyedLocks::new(),
        }
    }

    pub fn locks(&self) -> &KeyedLocks<String> {
        &self.locks
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: String) -> Result<Vec<CartLine>, CommerceError> {
        Ok(self.users.require_user(user_id).await?.cart)
    }

    /// Reserves `quantity` and adds it to the user's line for `key`.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn add_item(&self, user_id: String, key: StockKey, quantity: u32) -> Result<CartLine, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::ValidationError("quantity must be at least 1".to_string()));
        }
        let _guard = self.locks.lock(user_id.clone()).await;
        self.users.require_user(user_id.clone()).await?;

        self.ledger.reserve(&key, quantity).await?;
        match self.users.add_cart_line(user_id.clone(), key.clone(), quantity).await {
            Ok(line) => {
                info!(user_id = %user_id, quantity = line.quantity, "Cart line added");
                Ok(line)
            }
            Err(e) if e.is_indeterminate() => Err(unknown_outcome(e)),
            Err(e) => {
                warn!(error = %e, "Cart write failed, releasing reservation");
                self.compensate(self.ledger.release(&key, quantity).await, e)
            }
        }
    }

    /// Removes the line for `key` and releases its whole quantity.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn remove_item(&self, user_id: String, key: StockKey) -> Result<CartLine, CommerceError> {
        let _guard = self.locks.lock(user_id.clone()).await;
        let line = self.users.remove_cart_line(user_id.clone(), key.clone()).await?;

        if let Err(e) = self.ledger.release(&key, line.quantity).await {
            if e.is_indeterminate() {
                return Err(unknown_outcome(e));
            }
            warn!(error = %e, "Release failed, restoring cart line");
            let restored = self.users.restore_cart(user_id, vec![line]).await;
            return self.compensate(restored, e);
        }
        info!(user_id = %user_id, quantity = line.quantity, "Cart line removed");
        Ok(line)
    }

    /// Sets the line quantity, reserving or releasing only the difference.
    ///
    /// Reserving the difference against `stock - reservedStock` accepts
    /// exactly the quantities up to `stock - reservedStock + current`.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn update_quantity(&self, user_id: String, key: StockKey, quantity: u32) -> Result<CartLine, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::ValidationError("quantity must be at least 1".to_string()));
        }
        let _guard = self.locks.lock(user_id.clone()).await;
        let user = self.users.require_user(user_id.clone()).await?;
        let current = user
            .cart_line(&key)
            .map(|line| line.quantity)
            .ok_or_else(|| CommerceError::NotFound(format!("cart line {}", key)))?;

        if quantity == current {
            return user
                .cart_line(&key)
                .cloned()
                .ok_or_else(|| CommerceError::NotFound(format!("cart line {}", key)));
        }
        if quantity > current {
            self.ledger.reserve(&key, quantity - current).await?;
        } else {
            self.ledger.release(&key, current - quantity).await?;
        }

        match self.users.set_cart_quantity(user_id.clone(), key.clone(), quantity).await {
            Ok(line) => {
                info!(user_id = %user_id, from = current, to = quantity, "Cart quantity updated");
                Ok(line)
            }
            Err(e) if e.is_indeterminate() => Err(unknown_outcome(e)),
            Err(e) => {
                warn!(error = %e, "Cart write failed, reverting reservation");
                let reverted = if quantity > current {
                    self.ledger.release(&key, quantity - current).await
                } else {
                    // Only undoes our own release, so availability is not rechecked.
                    self.ledger.restore_reservation(&key, current - quantity).await
                };
                self.compensate(reverted, e)
            }
        }
    }

    fn compensate<T, U>(&self, compensation: Result<U, CommerceError>, cause: CommerceError) -> Result<T, CommerceError> {
        match compensation {
            Ok(_) => Err(cause),
            Err(e) => {
                error!(error = %e, cause = %cause, "Compensation failed, cart and ledger may disagree");
                Err(CommerceError::Indeterminate(format!(
                    "{} (compensation failed: {})",
                    cause, e
                )))
            }
        }
    }
}

fn unknown_outcome(cause: CommerceError) -> CommerceError {
    error!(error = %cause, "Outcome unknown, skipping compensation");
    cause
}
