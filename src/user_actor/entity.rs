use chrono::Utc;
use crate::actor_framework::Entity;
use crate::domain::{CartLine, User, UserCreate};
use super::actions::{UserAction, UserActionResult};
use super::error::UserError;

impl Entity for User {
    type Id = String;
    type CreateParams = UserCreate;
    // Profile edits belong to the account service.
    type Update = ();
    type Action = UserAction;
    type ActionResult = UserActionResult;
    type Error = UserError;

    /// Creates a new User with an empty cart.
    fn from_create_params(id: String, params: UserCreate) -> Result<Self, UserError> {
        if params.name.trim().is_empty() {
            return Err(UserError::Validation("name must not be empty".to_string()));
        }
        if !params.email.contains('@') {
            return Err(UserError::Validation(format!("invalid email: {}", params.email)));
        }
        Ok(Self {
            id,
            name: params.name,
            email: params.email,
            cart: Vec::new(),
        })
    }

    fn on_update(&mut self, _update: ()) -> Result<(), UserError> {
        Ok(())
    }

    fn handle_action(&mut self, action: UserAction) -> Result<UserActionResult, UserError> {
        let now = Utc::now();
        match action {
            UserAction::AddToCart { key, quantity } => {
                if quantity == 0 {
                    return Err(UserError::InvalidQuantity(quantity));
                }
                if let Some(line) = self.cart.iter_mut().find(|line| line.key == key) {
                    line.quantity = line.quantity.saturating_add(quantity);
                    line.updated_at = now;
                    return Ok(UserActionResult::AddToCart(line.clone()));
                }
                let line = CartLine {
                    key,
                    quantity,
                    added_at: now,
                    updated_at: now,
                };
                self.cart.push(line.clone());
                Ok(UserActionResult::AddToCart(line))
            }
            UserAction::RemoveFromCart { key } => {
                let index = self
                    .cart
                    .iter()
                    .position(|line| line.key == key)
                    .ok_or_else(|| UserError::CartLineNotFound(key.to_string()))?;
                Ok(UserActionResult::RemoveFromCart(self.cart.remove(index)))
            }
            UserAction::SetCartQuantity { key, quantity } => {
                if quantity == 0 {
                    return Err(UserError::InvalidQuantity(quantity));
                }
                let line = self
                    .cart
                    .iter_mut()
                    .find(|line| line.key == key)
                    .ok_or_else(|| UserError::CartLineNotFound(key.to_string()))?;
                line.quantity = quantity;
                line.updated_at = now;
                Ok(UserActionResult::SetCartQuantity(line.clone()))
            }
            UserAction::TakeCart => Ok(UserActionResult::TakeCart(std::mem::take(&mut self.cart))),
            UserAction::RestoreCart(lines) => {
                for restored in lines {
                    match self.cart.iter_mut().find(|line| line.key == restored.key) {
                        Some(line) => line.quantity = line.quantity.saturating_add(restored.quantity),
                        None => self.cart.push(restored),
                    }
                }
                Ok(UserActionResult::RestoreCart)
            }
        }
    }
}
