//! Domain types and business rules for the Lila Shop storefront.
//!
//! Everything in this crate is pure: no I/O, no clocks except where a
//! function says "today", no async. The HTTP side lives in `lila-client`.
//!
//! - **Voucher**: eligibility rules, discount amounts, code format
//! - **Cart / Catalog**: backend snapshots plus selection and pricing helpers
//! - **Checkout**: addresses, GHN parcel rules, price summary, order payloads
//! - **Chat**: widget state machine, staff inbox, scroll policy
//! - **Content / Support**: banners, reviews, complaint tickets
//!
//! # Example
//!
//! ```rust
//! use lila_commerce::prelude::*;
//!
//! let voucher = Voucher::percentage("SUMMER20", 20.0).capped_at(Money::new(50_000));
//! let ctx = OrderContext::new();
//! let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
//!
//! assert!(validate_voucher_on(Some(&voucher), Money::new(400_000), &ctx, today).is_ok());
//! assert_eq!(calculate_voucher_discount(&voucher, Money::new(400_000)), Money::new(50_000));
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod serde_helpers;
pub mod user;

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod content;
pub mod support;
pub mod voucher;

pub use error::CommerceError;
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::Money;
    pub use crate::user::{Role, UserProfile};

    // Catalog
    pub use crate::catalog::{Category, Product, ProductCategory, ProductVariant};

    // Cart
    pub use crate::cart::{Cart, CartItem};

    // Voucher
    pub use crate::voucher::{
        calculate_voucher_discount, filter_applicable_vouchers, validate_voucher,
        validate_voucher_code_format, validate_voucher_on, ApplyScope, DiscountValueType,
        OrderContext, StoreClock, Voucher, VoucherRejection, VoucherStatus,
    };

    // Checkout
    pub use crate::checkout::{
        Address, CheckoutSummary, DeliveryWindow, GhnSettings, Order, OrderPlacement,
        PaymentMethod, ServiceType,
    };

    // Chat
    pub use crate::chat::{
        ChatMessage, ChatView, ChatWidget, Conversation, ScrollAction, ScrollPolicy,
        SupportInbox, Viewport,
    };

    // Content and support
    pub use crate::content::{Banner, Review};
    pub use crate::support::{Ticket, TicketStatus};
}
