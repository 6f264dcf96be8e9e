//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in storefront domain operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variant not found.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Checkout has nothing to buy.
    #[error("Checkout has no items")]
    EmptyCheckout,

    /// Checkout incomplete.
    #[error("Checkout incomplete: missing {0}")]
    CheckoutIncomplete(String),

    /// Address is missing or malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Chat transition that the widget does not allow.
    #[error("Invalid chat transition from {from} to {to}")]
    InvalidChatTransition { from: String, to: String },

    /// No signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    /// The current user may not use this feature.
    #[error("Not permitted for role {0}")]
    RoleNotPermitted(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
