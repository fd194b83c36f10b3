use async_trait::async_trait;
use tracing::{debug, info, instrument};
use crate::actor_framework::ResourceClient;
use crate::catalog::CatalogStore;
use crate::domain::{Product, ProductCreate, StockDelta, StockKey, StockLevel};
use crate::error::CommerceError;
use crate::product_actor::ProductAction;

/// Client for interacting with the Product actor.
///
/// Also serves as the [`CatalogStore`] behind the stock ledger: the actor
/// applies one request at a time, so every movement is an atomic
/// check-and-set on its stock record.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

crate::impl_basic_client!(ProductClient, Product, product);

impl ProductClient {
    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<String, CommerceError> {
        debug!("Sending request");
        let id = self.inner.create(params).await?;
        info!(product_id = %id, "Product created");
        Ok(id)
    }

    async fn stock_action(&self, key: &StockKey, action: ProductAction) -> Result<StockLevel, CommerceError> {
        let result = self.inner.perform_action(key.product_id.clone(), action).await?;
        Ok(result.level())
    }
}

#[async_trait]
impl CatalogStore for ProductClient {
    async fn get_stock(&self, key: &StockKey) -> Result<StockLevel, CommerceError> {
        let action = ProductAction::GetStock { variant_id: key.variant_id.clone() };
        self.stock_action(key, action).await
    }

    async fn apply_stock_delta(&self, key: &StockKey, delta: StockDelta) -> Result<StockLevel, CommerceError> {
        let action = ProductAction::ApplyDelta { variant_id: key.variant_id.clone(), delta };
        self.stock_action(key, action).await
    }

    async fn apply_stock_deltas(&self, deltas: Vec<(StockKey, StockDelta)>) -> Result<Vec<StockLevel>, CommerceError> {
        let actions = deltas
            .into_iter()
            .map(|(key, delta)| {
                (
                    key.product_id,
                    ProductAction::ApplyDelta { variant_id: key.variant_id, delta },
                )
            })
            .collect();
        let results = self.inner.transact(actions).await?;
        Ok(results.iter().map(|result| result.level()).collect())
    }

    async fn set_active(&self, key: &StockKey, active: bool) -> Result<(), CommerceError> {
        let action = ProductAction::SetActive { variant_id: key.variant_id.clone(), active };
        self.stock_action(key, action).await.map(|_| ())
    }
}
