use tracing::{info, error};
use crate::clients::{CartClient, OrderClient, UserClient, ProductClient};
use crate::actor_framework::ResourceActor;
use crate::domain::{User, Product, Order};
use crate::ledger::StockLedger;
use crate::notify::{NotificationSink, Notifier};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

fn id_sequence(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || format!("{}_{}", prefix, counter.fetch_add(1, Ordering::SeqCst))
}

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct OrderSystem {
    pub order_client: OrderClient,
    pub cart_client: CartClient,
    pub user_client: UserClient,
    pub product_client: ProductClient,
    pub ledger: StockLedger,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderSystem {
    pub fn new(buffer: usize, sink: Arc<dyn NotificationSink>) -> Self {
        info!(buffer, "Starting order system");

        // 1. Users own the carts
        let (user_actor, user_resource_client) = ResourceActor::<User>::new(buffer, id_sequence("user"));
        let user_client = UserClient::new(user_resource_client);
        let user_handle = tokio::spawn(user_actor.run());

        // 2. Products hold the stock records behind the ledger
        let (product_actor, product_resource_client) = ResourceActor::<Product>::new(buffer, id_sequence("product"));
        let product_client = ProductClient::new(product_resource_client);
        let product_handle = tokio::spawn(product_actor.run());
        let ledger = StockLedger::new(Arc::new(product_client.clone()));

        // 3. Cart reservations
        let cart_client = CartClient::new(user_client.clone(), ledger.clone());

        // 4. Orders orchestrate everything above
        let (order_actor, order_resource_client) = ResourceActor::<Order>::new(buffer, id_sequence("order"));
        let order_client = OrderClient::new(
            order_resource_client,
            user_client.clone(),
            product_client.clone(),
            cart_client.clone(),
            ledger.clone(),
            Notifier::new(sink),
        );
        let order_handle = tokio::spawn(order_actor.run());

        Self {
            order_client,
            cart_client,
            user_client,
            product_client,
            ledger,
            handles: vec![user_handle, product_handle, order_handle],
        }
    }

    /// Drops every client (closing the actor channels) and waits for the actors to exit.
    ///
    /// Clones held elsewhere (e.g. by a router) keep their actors alive, so
    /// drop those first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        drop(self.order_client);
        drop(self.cart_client);
        drop(self.ledger);
        drop(self.user_client);
        drop(self.product_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
