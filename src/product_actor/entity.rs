use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, StockDelta, StockLevel, Variant};
use rust_decimal::Decimal;
use super::actions::{ProductAction, ProductActionResult};
use super::error::ProductError;

/// Mutable view over one stock record (product level or variant level).
struct Counters<'a> {
    stock: &'a mut u32,
    reserved_stock: &'a mut u32,
    is_active: &'a mut bool,
}

impl Counters<'_> {
    fn level(&self) -> StockLevel {
        StockLevel {
            stock: *self.stock,
            reserved_stock: *self.reserved_stock,
            is_active: *self.is_active,
        }
    }
}

fn floor_add(current: u32, delta: i64) -> u32 {
    (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

impl Product {
    fn counters_mut(&mut self, variant_id: Option<&str>) -> Result<Counters<'_>, ProductError> {
        match variant_id {
            None => Ok(Counters {
                stock: &mut self.stock,
                reserved_stock: &mut self.reserved_stock,
                is_active: &mut self.is_active,
            }),
            Some(variant_id) => {
                let product_id = self.id.clone();
                let variant = self
                    .variants
                    .iter_mut()
                    .find(|v| v.id == variant_id)
                    .ok_or_else(|| ProductError::VariantNotFound {
                        product_id,
                        variant_id: variant_id.to_string(),
                    })?;
                Ok(Counters {
                    stock: &mut variant.stock,
                    reserved_stock: &mut variant.reserved_stock,
                    is_active: &mut variant.is_active,
                })
            }
        }
    }

    /// Name and unit price used when snapshotting an order line.
    pub fn listing(&self, variant_id: Option<&str>) -> Option<(String, Decimal)> {
        match variant_id {
            None => Some((self.name.clone(), self.price)),
            Some(variant_id) => self.variants.iter().find(|v| v.id == variant_id).map(|v| {
                (format!("{} ({})", self.name, v.name), v.price.unwrap_or(self.price))
            }),
        }
    }
}

impl Entity for Product {
    type Id = String;
    type CreateParams = ProductCreate;
    // Stock is never written directly; catalog edits are out of scope.
    type Update = ();
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    /// Creates a new Product from creation parameters.
    ///
    /// Variant ids are derived from the product id: `<id>_v1`, `<id>_v2`, ...
    fn from_create_params(id: String, params: ProductCreate) -> Result<Self, ProductError> {
        if params.name.trim().is_empty() {
            return Err(ProductError::Validation("name must not be empty".to_string()));
        }
        if params.price.is_sign_negative() {
            return Err(ProductError::Validation("price must not be negative".to_string()));
        }
        let variants = params
            .variants
            .into_iter()
            .enumerate()
            .map(|(index, variant)| Variant {
                id: format!("{}_v{}", id, index + 1),
                name: variant.name,
                price: variant.price,
                stock: variant.stock,
                reserved_stock: 0,
                is_active: true,
            })
            .collect();
        Ok(Self {
            id,
            name: params.name,
            price: params.price,
            stock: params.stock,
            reserved_stock: 0,
            is_active: true,
            variants,
        })
    }

    fn on_update(&mut self, _update: ()) -> Result<(), ProductError> {
        Ok(())
    }

    /// Handles product-specific actions.
    ///
    /// # Actions
    /// - `GetStock`: Returns the current stock record
    /// - `ApplyDelta`: Atomic check-and-apply of a ledger movement
    /// - `SetActive`: Toggles whether the record is on sale
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::GetStock { variant_id } => {
                let counters = self.counters_mut(variant_id.as_deref())?;
                Ok(ProductActionResult::GetStock(counters.level()))
            }
            ProductAction::ApplyDelta { variant_id, delta } => {
                let counters = self.counters_mut(variant_id.as_deref())?;
                apply_delta(counters, delta).map(ProductActionResult::ApplyDelta)
            }
            ProductAction::SetActive { variant_id, active } => {
                let counters = self.counters_mut(variant_id.as_deref())?;
                *counters.is_active = active;
                Ok(ProductActionResult::SetActive(counters.level()))
            }
        }
    }
}

fn apply_delta(counters: Counters<'_>, delta: StockDelta) -> Result<StockLevel, ProductError> {
    if delta.require_available && delta.reserved > 0 {
        let available = counters.level().available();
        let requested = u32::try_from(delta.reserved).unwrap_or(u32::MAX);
        if requested > available {
            return Err(ProductError::InsufficientStock { requested, available });
        }
    }
    *counters.reserved_stock = floor_add(*counters.reserved_stock, delta.reserved);
    *counters.stock = floor_add(*counters.stock, delta.stock);
    Ok(counters.level())
}
