#[macro_use]
mod macros;
mod product_client;
mod user_client;
mod cart_client;
mod order_client;

pub use product_client::ProductClient;
pub use user_client::UserClient;
pub use cart_client::CartClient;
pub use order_client::OrderClient;
