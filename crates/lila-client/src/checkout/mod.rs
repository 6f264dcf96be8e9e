//! Checkout orchestration.
//!
//! [`Checkout`] sequences the backend calls behind the checkout screen:
//! loading the profile, cart (or a single product) and address book,
//! quoting GHN shipping, applying vouchers and placing the order. Pricing
//! and eligibility rules live in `lila_commerce`; this module only decides
//! what to call and what to keep when a call fails.

mod payment;

pub use payment::{complete_momo_payment, MomoReturn};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::inflight::InFlight;
use crate::storage::{CHECKOUT_INFO_KEY, LATEST_ORDER_KEY};
use futures::future::join_all;
use lila_commerce::cart::{subtotal_of, Cart, CartItem};
use lila_commerce::catalog::Product;
use lila_commerce::checkout::{
    pick_default_address, Address, CartCheckoutRequest, CheckoutInfo, CheckoutSummary,
    DeliveryWindow, Destination, DirectCheckoutRequest, FeeRequest, GhnSettings, LatestOrder,
    LeadTimeRequest, OrderPlacement, Parcel, PaymentMethod,
};
use lila_commerce::user::UserProfile;
use lila_commerce::voucher::{
    filter_applicable_vouchers_on, validate_voucher_code_format, validate_voucher_on,
    OrderContext, StoreClock, Voucher, VoucherRejection,
};
use lila_commerce::{AddressId, CartItemId, CommerceError, Money, OrderId, ProductId, VariantId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

/// Backend code for a voucher the customer already redeemed.
pub const VOUCHER_ALREADY_USED: i32 = 3009;

/// What is being bought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutSource {
    /// Items from the cart. An empty selection, or one matching nothing,
    /// means the whole cart.
    Cart { selected_item_ids: Vec<CartItemId> },
    /// "Buy now" on a single product.
    Direct {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
    },
}

impl CheckoutSource {
    pub fn whole_cart() -> Self {
        CheckoutSource::Cart {
            selected_item_ids: Vec::new(),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, CheckoutSource::Direct { .. })
    }
}

/// The cart, or a one-item cart plus its product for direct checkout.
async fn load_basket(
    api: &ApiClient,
    source: &CheckoutSource,
) -> Result<(Cart, Option<Product>), ClientError> {
    match source {
        CheckoutSource::Cart { .. } => Ok((api.cart().get().await?, None)),
        CheckoutSource::Direct {
            product_id,
            variant_id,
            quantity,
        } => {
            let product = api.products().get(product_id).await?;
            let cart = Cart::direct(&product, variant_id.clone(), *quantity)?;
            Ok((cart, Some(product)))
        }
    }
}

/// State of one checkout session.
#[derive(Debug)]
pub struct Checkout {
    api: ApiClient,
    settings: GhnSettings,
    clock: StoreClock,
    source: CheckoutSource,
    profile: UserProfile,
    /// Backend cart, or a local one-item snapshot for direct checkout.
    cart: Cart,
    items: Vec<CartItem>,
    catalog: HashMap<ProductId, Product>,
    addresses: Vec<Address>,
    address: Option<AddressId>,
    vouchers: Vec<Voucher>,
    shipping_fee: Money,
    delivery: Option<DeliveryWindow>,
    submitting: AtomicBool,
}

impl Checkout {
    /// Fetch everything the checkout screen needs.
    ///
    /// The profile, the cart (or product) and the address book load
    /// concurrently; any of them failing fails the load. Vouchers and
    /// per-item product details are best effort.
    pub async fn load(
        api: ApiClient,
        source: CheckoutSource,
        settings: GhnSettings,
        clock: StoreClock,
    ) -> Result<Self, ClientError> {
        if !api.is_signed_in() {
            return Err(ClientError::Unauthorized);
        }

        let auth = api.auth();
        let addresses_api = api.addresses();
        let (profile, (cart, direct_product), addresses) = tokio::try_join!(
            auth.my_info(),
            load_basket(&api, &source),
            addresses_api.list()
        )?;

        let items = match &source {
            CheckoutSource::Cart { selected_item_ids } => cart.select(selected_item_ids),
            CheckoutSource::Direct { .. } => cart.items.clone(),
        };

        let vouchers = match api.vouchers().active().await {
            Ok(vouchers) => vouchers,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!(error = %e, "could not load vouchers");
                Vec::new()
            }
        };

        let mut catalog = HashMap::new();
        match direct_product {
            Some(product) => {
                catalog.insert(product.id.clone(), product);
            }
            None => {
                let mut ids: Vec<&ProductId> = items.iter().map(|i| &i.product_id).collect();
                ids.sort();
                ids.dedup();
                let products = api.products();
                let fetched = join_all(ids.iter().map(|id| products.get(id))).await;
                for (id, result) in ids.into_iter().zip(fetched) {
                    match result {
                        Ok(product) => {
                            catalog.insert(id.clone(), product);
                        }
                        Err(e) => debug!(product_id = %id, error = %e, "product details unavailable"),
                    }
                }
            }
        }

        let address = pick_default_address(&addresses).map(|a| a.id.clone());
        info!(
            items = items.len(),
            addresses = addresses.len(),
            direct = source.is_direct(),
            "checkout loaded"
        );

        Ok(Self {
            api,
            settings,
            clock,
            source,
            profile,
            cart,
            items,
            catalog,
            addresses,
            address,
            vouchers,
            shipping_fee: Money::ZERO,
            delivery: None,
            submitting: AtomicBool::new(false),
        })
    }

    pub fn source(&self) -> &CheckoutSource {
        &self.source
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Items being bought.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// The selected shipping address.
    pub fn address(&self) -> Option<&Address> {
        let id = self.address.as_ref()?;
        self.addresses.iter().find(|a| &a.id == id)
    }

    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    pub fn delivery(&self) -> Option<DeliveryWindow> {
        self.delivery
    }

    pub fn applied_voucher(&self) -> Option<&str> {
        self.cart.applied_voucher_code.as_deref()
    }

    pub fn voucher_discount(&self) -> Money {
        self.cart.discount()
    }

    pub fn subtotal(&self) -> Money {
        subtotal_of(&self.items)
    }

    /// Product and category ids of the items, for voucher scope checks.
    pub fn order_context(&self) -> OrderContext {
        let products = self.items.iter().map(|i| i.product_id.as_str());
        let categories = self
            .items
            .iter()
            .filter_map(|i| self.catalog.get(&i.product_id))
            .filter_map(|p| p.category_id())
            .map(|c| c.as_str());
        OrderContext::new()
            .with_products(products)
            .with_categories(categories)
    }

    fn parcel_products(&self) -> Vec<Option<Product>> {
        self.items
            .iter()
            .map(|i| self.catalog.get(&i.product_id).cloned())
            .collect()
    }

    /// Select another address from the book. Quotes are reset; call
    /// [`refresh_quotes`](Self::refresh_quotes) afterwards.
    pub fn select_address(&mut self, id: &AddressId) -> Result<&Address, ClientError> {
        if !self.addresses.iter().any(|a| &a.id == id) {
            return Err(ClientError::NotFound(format!("address {id}")));
        }
        self.address = Some(id.clone());
        self.shipping_fee = Money::ZERO;
        self.delivery = None;
        self.address()
            .ok_or_else(|| ClientError::NotFound(format!("address {id}")))
    }

    /// Re-read the address book, keeping the selection when it still exists.
    pub async fn reload_addresses(&mut self) -> Result<(), ClientError> {
        self.addresses = self.api.addresses().list().await?;
        let kept = self
            .address
            .as_ref()
            .is_some_and(|id| self.addresses.iter().any(|a| &a.id == id));
        if !kept {
            self.address = pick_default_address(&self.addresses).map(|a| a.id.clone());
        }
        Ok(())
    }

    fn destination(&self) -> Option<Destination> {
        let address = self.address()?;
        match Destination::from_address(address) {
            Ok(destination) => Some(destination),
            Err(e) => {
                debug!(address_id = %address.id, error = %e, "address cannot be quoted");
                None
            }
        }
    }

    /// Quote the GHN fee for the selected address. Any failure leaves the
    /// fee at zero.
    pub async fn refresh_shipping_fee(&mut self) -> Money {
        self.shipping_fee = Money::ZERO;
        let Some(destination) = self.destination() else {
            return self.shipping_fee;
        };
        let products = self.parcel_products();
        let parcel = Parcel::new(&self.items, &products);
        let request = match FeeRequest::build(&parcel, &destination, &self.settings) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "no fee request");
                return self.shipping_fee;
            }
        };
        match self.api.ghn().fee(&request).await {
            Ok(quote) => {
                self.shipping_fee = quote.total.unwrap_or_default().non_negative();
                debug!(
                    fee = self.shipping_fee.amount(),
                    service_type = request.service_type_id,
                    "shipping fee quoted"
                );
            }
            Err(e) => warn!(error = %e, "shipping fee quote failed"),
        }
        self.shipping_fee
    }

    /// Quote the GHN delivery window for the selected address.
    pub async fn refresh_lead_time(&mut self) -> Option<DeliveryWindow> {
        self.delivery = None;
        let destination = self.destination()?;
        let products = self.parcel_products();
        let parcel = Parcel::new(&self.items, &products);
        let request = LeadTimeRequest::build(&parcel, &destination, &self.settings).ok()?;
        match self.api.ghn().lead_time(&request).await {
            Ok(quote) => self.delivery = DeliveryWindow::from_quote(&quote, self.clock.offset()),
            Err(e) => warn!(error = %e, "lead time quote failed"),
        }
        self.delivery
    }

    /// Refresh both GHN quotes.
    pub async fn refresh_quotes(&mut self) {
        self.refresh_shipping_fee().await;
        self.refresh_lead_time().await;
    }

    /// Vouchers the customer could apply now; empty once one is applied.
    pub fn applicable_vouchers(&self) -> Vec<&Voucher> {
        if self.applied_voucher().is_some() {
            return Vec::new();
        }
        filter_applicable_vouchers_on(
            &self.vouchers,
            self.subtotal(),
            &self.order_context(),
            self.clock.today(),
        )
    }

    /// Check a typed code locally, then ask the backend to apply it.
    /// Returns the discount granted.
    pub async fn apply_voucher(&mut self, code: &str) -> Result<Money, ClientError> {
        let code = validate_voucher_code_format(code)?;
        if self.items.is_empty() {
            return Err(CommerceError::EmptyCheckout.into());
        }
        let subtotal = self.subtotal();
        if subtotal.is_non_positive() {
            return Err(VoucherRejection::NonPositiveTotal.into());
        }
        let voucher = self
            .vouchers
            .iter()
            .find(|v| v.code.trim().eq_ignore_ascii_case(&code))
            .ok_or_else(|| VoucherRejection::UnknownCode { code: code.clone() })?;
        validate_voucher_on(
            Some(voucher),
            subtotal,
            &self.order_context(),
            self.clock.today(),
        )?;

        let cart = match self.api.cart().apply_voucher(&code, subtotal).await {
            Ok(cart) => cart,
            Err(e) if e.code() == Some(VOUCHER_ALREADY_USED) => {
                self.cart.clear_voucher();
                return Err(VoucherRejection::AlreadyUsed { code }.into());
            }
            Err(e) => return Err(e),
        };

        if self.source.is_direct() {
            self.cart.set_voucher(Some(code.clone()), cart.discount());
        } else {
            self.replace_cart(cart);
        }
        info!(code = %code, discount = self.voucher_discount().amount(), "voucher applied");
        Ok(self.voucher_discount())
    }

    /// Drop the applied voucher.
    pub async fn clear_voucher(&mut self) -> Result<(), ClientError> {
        let cart = self.api.cart().clear_voucher().await?;
        if self.source.is_direct() {
            self.cart.clear_voucher();
        } else {
            self.replace_cart(cart);
        }
        Ok(())
    }

    /// Take a fresh backend cart, keeping the items already chosen.
    fn replace_cart(&mut self, cart: Cart) {
        self.items = self
            .items
            .iter()
            .filter_map(|chosen| cart.item(&chosen.id).cloned())
            .collect();
        self.cart = cart;
    }

    /// Drop an item from the order on the confirmation step.
    pub async fn remove_item(&mut self, id: &CartItemId) -> Result<(), ClientError> {
        if !self.items.iter().any(|i| &i.id == id) {
            return Err(CommerceError::ItemNotInCart(id.to_string()).into());
        }
        if self.source.is_direct() {
            self.cart.remove_item(id);
        } else {
            self.cart = self.api.cart().remove_item(id).await?;
        }
        self.items.retain(|i| &i.id != id);
        Ok(())
    }

    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary::new(&self.items, self.shipping_fee, self.voucher_discount())
    }

    /// Submit the order.
    ///
    /// COD confirms immediately. MoMo returns the hosted payment page and
    /// stashes what [`complete_momo_payment`] needs once the customer comes
    /// back. A second call while one is running is refused with
    /// [`ClientError::Busy`].
    pub async fn place_order(&self, method: PaymentMethod) -> Result<OrderPlacement, ClientError> {
        let Some(_submitting) = InFlight::try_start(&self.submitting) else {
            return Err(ClientError::Busy);
        };

        if self.items.is_empty() {
            return Err(CommerceError::EmptyCheckout.into());
        }
        let address = self
            .address()
            .filter(|a| a.has_shipping_info())
            .ok_or_else(|| CommerceError::CheckoutIncomplete("shipping information".to_string()))?;
        let shipping_address = address.shipping_info().to_json_string()?;
        let summary = self.summary();

        self.persist(
            LATEST_ORDER_KEY,
            &LatestOrder::new(&summary, address, method, None, None),
        );

        let result = match &self.source {
            CheckoutSource::Cart { .. } => {
                let body = CartCheckoutRequest {
                    address_id: Some(address.id.clone()),
                    shipping_address: shipping_address.clone(),
                    note: String::new(),
                    shipping_fee: self.shipping_fee,
                    cart_item_ids: self.items.iter().map(|i| i.id.clone()).collect(),
                    payment_method: method,
                };
                self.api.orders().checkout(&body).await?
            }
            CheckoutSource::Direct {
                product_id,
                variant_id,
                ..
            } => {
                let quantity = self.items.iter().map(CartItem::effective_quantity).sum::<i64>();
                let body = DirectCheckoutRequest {
                    product_id: product_id.clone(),
                    quantity,
                    variant_id: variant_id.clone(),
                    address_id: Some(address.id.clone()),
                    shipping_address: shipping_address.clone(),
                    note: String::new(),
                    shipping_fee: self.shipping_fee,
                    payment_method: method,
                };
                self.api.orders().checkout_direct(&body).await?
            }
        };

        let placement = OrderPlacement::from_result(method, result)?;
        let (order_id, code): (Option<OrderId>, Option<String>) = match &placement {
            OrderPlacement::Confirmed(order) => (Some(order.id.clone()), order.code.clone()),
            OrderPlacement::Redirect { order_code, .. } => (None, order_code.clone()),
        };
        self.persist(
            LATEST_ORDER_KEY,
            &LatestOrder::new(&summary, address, method, order_id, code.clone()),
        );

        if let OrderPlacement::Redirect { .. } = &placement {
            let info = self.checkout_info(method, code, address, shipping_address, summary);
            self.persist(CHECKOUT_INFO_KEY, &info);
        }

        match &placement {
            OrderPlacement::Confirmed(order) => {
                info!(order = order.display_code(), method = %method, "order placed")
            }
            OrderPlacement::Redirect { order_code, .. } => {
                info!(order_code = ?order_code, method = %method, "awaiting payment")
            }
        }
        Ok(placement)
    }

    fn checkout_info(
        &self,
        method: PaymentMethod,
        order_code: Option<String>,
        address: &Address,
        shipping_address: String,
        summary: CheckoutSummary,
    ) -> CheckoutInfo {
        let (product_id, quantity, variant_id) = match &self.source {
            CheckoutSource::Direct {
                product_id,
                variant_id,
                ..
            } => (
                Some(product_id.clone()),
                Some(self.items.iter().map(CartItem::effective_quantity).sum::<i64>()),
                variant_id.clone(),
            ),
            CheckoutSource::Cart { .. } => (None, None, None),
        };
        CheckoutInfo {
            payment_method: method,
            order_code,
            direct_checkout: self.source.is_direct(),
            product_id,
            quantity,
            variant_id,
            address_id: Some(address.id.clone()),
            shipping_address,
            shipping_fee: self.shipping_fee,
            cart_item_ids: if self.source.is_direct() {
                Vec::new()
            } else {
                self.items.iter().map(|i| i.id.clone()).collect()
            },
            summary,
            address: address.shipping_info(),
        }
    }

    /// Write a snapshot; failures are logged and otherwise ignored.
    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.api.store().set(key, value) {
            warn!(key, error = %e, "could not write checkout snapshot");
        }
    }
}
