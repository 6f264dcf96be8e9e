//! Shopping cart module.
//!
//! The cart lives on the backend; these types mirror its snapshot and add
//! the selection and pricing helpers checkout needs.

mod cart;

pub use cart::{subtotal_of, Cart, CartItem, DIRECT_ITEM_ID, MAX_QUANTITY_PER_ITEM};
