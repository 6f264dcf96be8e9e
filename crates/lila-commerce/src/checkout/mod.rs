//! Checkout module.
//!
//! Addresses, GHN locations and parcel rules, the price summary, and the
//! order placement payloads. Sequencing the backend calls is the client's
//! job; everything here is pure.

mod address;
mod location;
mod order;
mod shipping;
mod summary;

pub use address::{pick_default_address, Address, AddressPayload, ShippingInfo};
pub use location::{normalize_districts, normalize_provinces, normalize_wards, District, Province, Ward};
pub use order::{
    CartCheckoutRequest, CheckoutInfo, CheckoutResult, DirectCheckoutRequest, LatestOrder,
    LatestOrderItem, Order, OrderPlacement, OrderStatus, PaymentMethod,
};
pub use shipping::{
    DeliveryWindow, Destination, FeeItem, FeeItemCategory, FeeQuote, FeeRequest, GhnSettings,
    LeadTimeOrder, LeadTimeQuote, LeadTimeRequest, Parcel, ServiceType, DEFAULT_ITEM_NAME,
};
pub use summary::{CheckoutSummary, SummaryLine};
