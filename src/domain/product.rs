use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a product in the catalog, with optional per-variant stock.
///
/// Stock counters are only ever changed through the stock ledger; see
/// [`ProductAction`](crate::product_actor::ProductAction).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    pub reserved_stock: u32,
    pub is_active: bool,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub name: String,
    /// Overrides the product price when set.
    pub price: Option<Decimal>,
    pub stock: u32,
    pub reserved_stock: u32,
    pub is_active: bool,
}

/// Payload for creating a new product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default)]
    pub variants: Vec<VariantCreate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCreate {
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub stock: u32,
}

impl ProductCreate {
    pub fn new(name: impl Into<String>, price: Decimal, stock: u32) -> Self {
        Self {
            name: name.into(),
            price,
            stock,
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, name: impl Into<String>, price: Option<Decimal>, stock: u32) -> Self {
        self.variants.push(VariantCreate {
            name: name.into(),
            price,
            stock,
        });
        self
    }
}

/// Addresses one stock record: the variant when `variant_id` is set,
/// otherwise the product-level counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
}

impl StockKey {
    pub fn product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
        }
    }

    pub fn variant(product_id: impl Into<String>, variant_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: Some(variant_id.into()),
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant_id {
            Some(variant) => write!(f, "{}/{}", self.product_id, variant),
            None => write!(f, "{}", self.product_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub stock: u32,
    pub reserved_stock: u32,
    pub is_active: bool,
}

impl StockLevel {
    /// Units that can still be reserved.
    pub fn available(&self) -> u32 {
        if !self.is_active {
            return 0;
        }
        self.stock.saturating_sub(self.reserved_stock)
    }
}

/// Signed change to one stock record. Results are floored at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    pub reserved: i64,
    pub stock: i64,
    /// Reject a positive `reserved` change that exceeds availability.
    pub require_available: bool,
}

impl StockDelta {
    pub fn reserve(quantity: u32) -> Self {
        Self {
            reserved: i64::from(quantity),
            stock: 0,
            require_available: true,
        }
    }

    /// Re-reserves units this caller just released; skips the availability check.
    pub fn restore(quantity: u32) -> Self {
        Self {
            require_available: false,
            ..Self::reserve(quantity)
        }
    }

    pub fn release(quantity: u32) -> Self {
        Self {
            reserved: -i64::from(quantity),
            stock: 0,
            require_available: false,
        }
    }

    pub fn commit(quantity: u32) -> Self {
        Self {
            reserved: -i64::from(quantity),
            stock: -i64::from(quantity),
            require_available: false,
        }
    }

    /// Inverse of [`StockDelta::commit`].
    pub fn uncommit(quantity: u32) -> Self {
        Self {
            reserved: i64::from(quantity),
            stock: i64::from(quantity),
            require_available: false,
        }
    }
}
