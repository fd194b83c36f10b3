//! Stock ledger: reserve, release and commit over the catalog store.
//!
//! `reserved_stock` grows when a cart line is added and shrinks when the line
//! is removed or its order settles; `stock` only shrinks on commit. Every
//! movement is floored at zero by the store.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::catalog::CatalogStore;
use crate::domain::{OrderItem, StockDelta, StockKey, StockLevel};
use crate::error::CommerceError;

/// Outcome of a batch movement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settlement {
    pub levels: Vec<StockLevel>,
    /// Records this batch took off sale.
    pub deactivated: Vec<StockKey>,
}

#[derive(Clone)]
pub struct StockLedger {
    catalog: Arc<dyn CatalogStore>,
}

fn ensure_positive(quantity: u32) -> Result<(), CommerceError> {
    if quantity == 0 {
        return Err(CommerceError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl StockLedger {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    #[cfg(test)]
    pub async fn level(&self, key: &StockKey) -> Result<StockLevel, CommerceError> {
        self.catalog.get_stock(key).await
    }

    /// Holds `quantity` units; fails with `InsufficientStock` when
    /// `stock - reserved_stock` is smaller.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn reserve(&self, key: &StockKey, quantity: u32) -> Result<StockLevel, CommerceError> {
        ensure_positive(quantity)?;
        let level = self.catalog.apply_stock_delta(key, StockDelta::reserve(quantity)).await?;
        info!(reserved_stock = level.reserved_stock, "Stock reserved");
        Ok(level)
    }

    #[instrument(skip(self), fields(key = %key))]
    pub async fn release(&self, key: &StockKey, quantity: u32) -> Result<StockLevel, CommerceError> {
        ensure_positive(quantity)?;
        let level = self.catalog.apply_stock_delta(key, StockDelta::release(quantity)).await?;
        info!(reserved_stock = level.reserved_stock, "Stock released");
        Ok(level)
    }

    /// Undoes a release made by the same caller, even if the units were
    /// reserved elsewhere in between.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn restore_reservation(&self, key: &StockKey, quantity: u32) -> Result<StockLevel, CommerceError> {
        ensure_positive(quantity)?;
        let level = self.catalog.apply_stock_delta(key, StockDelta::restore(quantity)).await?;
        warn!(reserved_stock = level.reserved_stock, "Reservation restored");
        Ok(level)
    }

    /// Converts a reservation into a deduction and takes a depleted record off sale.
    #[cfg(test)]
    #[instrument(skip(self), fields(key = %key))]
    pub async fn commit(&self, key: &StockKey, quantity: u32) -> Result<StockLevel, CommerceError> {
        ensure_positive(quantity)?;
        let level = self.catalog.apply_stock_delta(key, StockDelta::commit(quantity)).await?;
        info!(stock = level.stock, reserved_stock = level.reserved_stock, "Stock committed");
        self.deactivate_if_depleted(key, level).await
    }

    /// Commits every order item in one all-or-nothing batch.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn commit_all(&self, items: &[OrderItem]) -> Result<Settlement, CommerceError> {
        let movements = batch(items, StockDelta::commit)?;
        let keys: Vec<StockKey> = movements.iter().map(|(key, _)| key.clone()).collect();
        let levels = self.catalog.apply_stock_deltas(movements).await?;
        info!("Order stock committed");

        let mut settlement = Settlement::default();
        for (key, level) in keys.into_iter().zip(levels) {
            let settled = self.deactivate_if_depleted(&key, level).await?;
            if level.is_active && !settled.is_active {
                settlement.deactivated.push(key);
            }
            settlement.levels.push(settled);
        }
        Ok(settlement)
    }

    /// Releases every order item in one all-or-nothing batch.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn release_all(&self, items: &[OrderItem]) -> Result<Settlement, CommerceError> {
        let movements = batch(items, StockDelta::release)?;
        let levels = self.catalog.apply_stock_deltas(movements).await?;
        info!("Order stock released");
        Ok(Settlement { levels, deactivated: Vec::new() })
    }

    /// Undoes a `commit_all`/`release_all` whose order could not be saved.
    #[instrument(skip(self, items, settlement), fields(items = items.len()))]
    pub async fn revert(&self, items: &[OrderItem], committed: bool, settlement: &Settlement) -> Result<(), CommerceError> {
        let movement: fn(u32) -> StockDelta = if committed { StockDelta::uncommit } else { StockDelta::restore };
        self.catalog.apply_stock_deltas(batch(items, movement)?).await?;
        for key in &settlement.deactivated {
            self.catalog.set_active(key, true).await?;
        }
        warn!(committed, "Order stock movement reverted");
        Ok(())
    }

    async fn deactivate_if_depleted(&self, key: &StockKey, level: StockLevel) -> Result<StockLevel, CommerceError> {
        if level.stock > 0 || !level.is_active {
            return Ok(level);
        }
        // Commit has already happened; a failure here only leaves the
        // record on sale with zero availability.
        if let Err(e) = self.catalog.set_active(key, false).await {
            warn!(key = %key, error = %e, "Failed to take depleted stock off sale");
            return Ok(level);
        }
        info!(key = %key, "Stock depleted, taken off sale");
        Ok(StockLevel { is_active: false, ..level })
    }
}

fn batch(items: &[OrderItem], movement: fn(u32) -> StockDelta) -> Result<Vec<(StockKey, StockDelta)>, CommerceError> {
    items
        .iter()
        .map(|item| {
            ensure_positive(item.quantity)?;
            Ok((item.key(), movement(item.quantity)))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryCatalog;
    use super::*;
    use rust_decimal::Decimal;

    fn item(product_id: &str, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: product_id.to_string(),
            variant_id: None,
            product_name: product_id.to_string(),
            unit_price: Decimal::ONE,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_commit_deducts_and_deactivates_at_zero() {
        let key = StockKey::product("p1");
        let catalog = Arc::new(MemoryCatalog::with(vec![(key.clone(), 3, 3)]));
        let ledger = StockLedger::new(catalog.clone());

        let level = ledger.commit(&key, 3).await.unwrap();
        assert_eq!(level, StockLevel { stock: 0, reserved_stock: 0, is_active: false });
        assert!(!catalog.level(&key).is_active);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let key = StockKey::product("p1");
        let ledger = StockLedger::new(Arc::new(MemoryCatalog::with(vec![(key.clone(), 3, 0)])));
        assert!(matches!(ledger.reserve(&key, 0).await, Err(CommerceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_release_all_conserves_other_counters() {
        let (p1, p2) = (StockKey::product("p1"), StockKey::product("p2"));
        let catalog = Arc::new(MemoryCatalog::with(vec![(p1.clone(), 10, 4), (p2.clone(), 8, 5)]));
        let ledger = StockLedger::new(catalog.clone());

        ledger.release_all(&[item("p1", 3), item("p2", 5)]).await.unwrap();
        assert_eq!(catalog.level(&p1), StockLevel { stock: 10, reserved_stock: 1, is_active: true });
        assert_eq!(catalog.level(&p2), StockLevel { stock: 8, reserved_stock: 0, is_active: true });
    }

    #[tokio::test]
    async fn test_failed_batch_changes_nothing() {
        let (p1, p2) = (StockKey::product("p1"), StockKey::product("p2"));
        let catalog = Arc::new(MemoryCatalog::with(vec![(p1.clone(), 10, 3), (p2.clone(), 8, 2)]));
        catalog.failing.lock().unwrap().push(p2.clone());
        let ledger = StockLedger::new(catalog.clone());

        let err = ledger.commit_all(&[item("p1", 3), item("p2", 2)]).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(catalog.level(&p1), StockLevel { stock: 10, reserved_stock: 3, is_active: true });
    }

    #[tokio::test]
    async fn test_floor_invariant_over_mixed_sequence() {
        let key = StockKey::product("p1");
        let catalog = Arc::new(MemoryCatalog::with(vec![(key.clone(), 4, 0)]));
        let ledger = StockLedger::new(catalog.clone());

        ledger.reserve(&key, 2).await.unwrap();
        ledger.release(&key, 5).await.unwrap();
        ledger.commit(&key, 3).await.unwrap();
        ledger.release(&key, 1).await.unwrap();
        ledger.commit(&key, 7).await.unwrap();

        let level = catalog.level(&key);
        assert_eq!(level.stock, 0);
        assert_eq!(level.reserved_stock, 0);
    }
}
