//! Catalog store abstraction used by the stock ledger.

use async_trait::async_trait;

use crate::domain::{StockDelta, StockKey, StockLevel};
use crate::error::CommerceError;

/// Read/write access to product and variant stock counters.
///
/// Implementations must apply each call atomically per stock record, and
/// `apply_stock_deltas` atomically across the whole batch.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_stock(&self, key: &StockKey) -> Result<StockLevel, CommerceError>;

    /// Applies one movement, floored at zero, and returns the new level.
    async fn apply_stock_delta(&self, key: &StockKey, delta: StockDelta) -> Result<StockLevel, CommerceError>;

    /// Applies every movement or none of them. Levels are returned in input order.
    async fn apply_stock_deltas(&self, deltas: Vec<(StockKey, StockDelta)>) -> Result<Vec<StockLevel>, CommerceError>;

    async fn set_active(&self, key: &StockKey, active: bool) -> Result<(), CommerceError>;
}
