use tracing::{debug, info, instrument};
use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{CartLine, StockKey, User, UserCreate};
use crate::error::CommerceError;
use crate::user_actor::{UserAction, UserActionResult};

/// Client for interacting with the User actor, including raw cart rows.
///
/// Cart rows here carry no stock semantics; use
/// [`CartClient`](super::CartClient) to keep them in step with the ledger.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

crate::impl_basic_client!(UserClient, User, user);

fn unexpected(result: UserActionResult) -> CommerceError {
    FrameworkError::<crate::user_actor::UserError>::UnexpectedResult(format!("{:?}", result)).into()
}

impl UserClient {
    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create_user(&self, params: UserCreate) -> Result<String, CommerceError> {
        debug!("Sending request");
        let id = self.inner.create(params).await?;
        info!(user_id = %id, "User created");
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn add_cart_line(&self, user_id: String, key: StockKey, quantity: u32) -> Result<CartLine, CommerceError> {
        debug!("Sending request");
        match self.inner.perform_action(user_id, UserAction::AddToCart { key, quantity }).await? {
            UserActionResult::AddToCart(line) => Ok(line),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_cart_line(&self, user_id: String, key: StockKey) -> Result<CartLine, CommerceError> {
        debug!("Sending request");
        match self.inner.perform_action(user_id, UserAction::RemoveFromCart { key }).await? {
            UserActionResult::RemoveFromCart(line) => Ok(line),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn set_cart_quantity(&self, user_id: String, key: StockKey, quantity: u32) -> Result<CartLine, CommerceError> {
        debug!("Sending request");
        match self.inner.perform_action(user_id, UserAction::SetCartQuantity { key, quantity }).await? {
            UserActionResult::SetCartQuantity(line) => Ok(line),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn take_cart(&self, user_id: String) -> Result<Vec<CartLine>, CommerceError> {
        debug!("Sending request");
        match self.inner.perform_action(user_id, UserAction::TakeCart).await? {
            UserActionResult::TakeCart(lines) => Ok(lines),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn restore_cart(&self, user_id: String, lines: Vec<CartLine>) -> Result<(), CommerceError> {
        debug!("Sending request");
        match self.inner.perform_action(user_id, UserAction::RestoreCart(lines)).await? {
            UserActionResult::RestoreCart => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}
