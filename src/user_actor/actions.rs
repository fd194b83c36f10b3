use crate::domain::{CartLine, StockKey};

/// Cart actions on a User entity.
///
/// These only touch cart rows; the matching stock reservation is handled by
/// [`CartClient`](crate::clients::CartClient).
#[derive(Debug, Clone)]
pub enum UserAction {
    /// Appends a line, or grows the quantity of an existing line for the same key.
    AddToCart { key: StockKey, quantity: u32 },
    /// Removes a line and returns it.
    RemoveFromCart { key: StockKey },
    /// Replaces the quantity of an existing line.
    SetCartQuantity { key: StockKey, quantity: u32 },
    /// Empties the cart and returns its lines (checkout).
    TakeCart,
    /// Puts lines back after a failed checkout.
    RestoreCart(Vec<CartLine>),
}

/// Results from UserActions - variants match 1:1 with UserAction
#[derive(Debug, Clone)]
pub enum UserActionResult {
    AddToCart(CartLine),
    RemoveFromCart(CartLine),
    SetCartQuantity(CartLine),
    TakeCart(Vec<CartLine>),
    RestoreCart,
}
