//! Backend access, checkout orchestration and chat polling for the Lila
//! Shop storefront.
//!
//! - **api**: typed services over the REST backend, plus back-office clients
//! - **checkout**: the checkout session, from loading the cart to placing
//!   the order and finishing a MoMo payment
//! - **chat**: background pollers for the customer widget and the support desk
//! - **storage**: the local key-value snapshot (token, latest order, pending
//!   checkout)
//! - **config**: TOML/JSON configuration with environment overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use lila_client::prelude::*;
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::from_config(&config)?;
//! api.auth().login("lan@example.com", "secret").await?;
//!
//! let mut checkout = Checkout::load(
//!     api.clone(),
//!     CheckoutSource::whole_cart(),
//!     config.ghn.clone(),
//!     config.clock()?,
//! )
//! .await?;
//! checkout.refresh_quotes().await;
//! checkout.apply_voucher("SUMMER20").await?;
//! let placement = checkout.place_order(PaymentMethod::Cod).await?;
//! ```

pub mod api;
pub mod chat;
pub mod checkout;
pub mod config;
pub mod error;
mod inflight;
pub mod storage;

pub use api::ApiClient;
pub use chat::{ChatEvent, ChatPoller, DeskEvent, PollerHandle, SupportDesk};
pub use checkout::{complete_momo_payment, Checkout, CheckoutSource, MomoReturn};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use storage::{LocalStore, StoreError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::api::ApiClient;
    pub use crate::chat::{ChatEvent, ChatPoller, DeskEvent, PollerHandle, SupportDesk};
    pub use crate::checkout::{complete_momo_payment, Checkout, CheckoutSource, MomoReturn};
    pub use crate::config::ClientConfig;
    pub use crate::error::ClientError;
    pub use crate::storage::LocalStore;

    pub use lila_commerce::checkout::{OrderPlacement, PaymentMethod};
    pub use lila_commerce::Money;
}
