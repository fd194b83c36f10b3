use crate::domain::{StockDelta, StockLevel};

/// Custom actions for Product entities.
///
/// Every action addresses either the product-level counters (`variant_id`
/// is `None`) or one variant's counters.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Reads the stock record without modifying it.
    GetStock { variant_id: Option<String> },
    /// Applies a signed change to `stock` and `reserved_stock`, floored at zero.
    ///
    /// # Errors
    /// Fails when `delta.require_available` is set and the reservation
    /// exceeds `stock - reserved_stock`.
    ApplyDelta { variant_id: Option<String>, delta: StockDelta },
    /// Puts the record on or off sale.
    SetActive { variant_id: Option<String>, active: bool },
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone)]
pub enum ProductActionResult {
    GetStock(StockLevel),
    ApplyDelta(StockLevel),
    SetActive(StockLevel),
}

impl ProductActionResult {
    /// Every product action answers with the resulting stock level.
    pub fn level(&self) -> StockLevel {
        match self {
            ProductActionResult::GetStock(level)
            | ProductActionResult::ApplyDelta(level)
            | ProductActionResult::SetActive(level) => *level,
        }
    }
}
