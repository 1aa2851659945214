//! Domain model: users, products, carts, wishlists, orders
pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{CartLine, LineItems, WishItems, WishLine};
pub use order::{Order, OrderItem, PaymentRecord, ShippingAddress};
pub use product::{CatalogQuery, Product};
pub use user::{User, UserAddress};
