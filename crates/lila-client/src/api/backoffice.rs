//! Staff and admin endpoints: catalog and content CRUD, complaint tickets,
//! review moderation and approval queues.
//!
//! Every write validates its payload locally before anything is sent.

use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::catalog::{Category, CategoryPayload, Product, ProductPayload};
use lila_commerce::content::{sort_banners, Banner, BannerPayload, Review};
use lila_commerce::support::{Ticket, TicketAction, TicketNote, TicketPayload};
use lila_commerce::voucher::Voucher;
use lila_commerce::{BannerId, CategoryId, ProductId, ReviewId, TicketId, VoucherId};
use lila_data::Method;
use serde::Serialize;
use tracing::info;

/// Outcome of a moderation review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    /// Rejections must say why.
    Reject { reason: String },
}

impl Decision {
    pub fn reject(reason: impl Into<String>) -> Self {
        Decision::Reject {
            reason: reason.into(),
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Reject { .. } => "REJECT",
        }
    }

    fn reason(&self) -> Result<Option<&str>, ClientError> {
        match self {
            Decision::Approve => Ok(None),
            Decision::Reject { reason } => {
                let reason = reason.trim();
                if reason.is_empty() {
                    Err(ClientError::Validation(
                        "a rejection reason is required".to_string(),
                    ))
                } else {
                    Ok(Some(reason))
                }
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductApproval<'a> {
    product_id: &'a ProductId,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoucherApproval<'a> {
    voucher_id: &'a VoucherId,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct ReviewReply<'a> {
    reply: &'a str,
}

/// Back-office services.
pub struct BackOffice<'a> {
    client: &'a ApiClient,
}

impl<'a> BackOffice<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn item_path(collection: &str, id: &str) -> String {
        format!("{collection}/{}", segment(id))
    }

    // Products

    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.client.get_list("/products").await
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ClientError> {
        if payload.id.is_none() {
            return Err(ClientError::Validation("product code is required".to_string()));
        }
        payload.validate()?;
        let product: Product = self
            .client
            .send(self.client.request(Method::Post, "/products").json(payload))
            .await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, ClientError> {
        payload.validate()?;
        let path = Self::item_path("/products", id.as_str());
        self.client
            .send(self.client.request(Method::Put, &path).json(payload))
            .await
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ClientError> {
        let path = Self::item_path("/products", id.as_str());
        self.client
            .send_unit(self.client.request(Method::Delete, &path))
            .await
    }

    /// Approve or reject a product submitted by staff.
    pub async fn review_product(
        &self,
        id: &ProductId,
        decision: &Decision,
    ) -> Result<Product, ClientError> {
        let body = ProductApproval {
            product_id: id,
            action: decision.action(),
            reason: decision.reason()?,
        };
        let product: Product = self
            .client
            .send(
                self.client
                    .request(Method::Post, "/products/approve")
                    .json(&body),
            )
            .await?;
        info!(product_id = %id, action = decision.action(), "product reviewed");
        Ok(product)
    }

    // Categories

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.client.get_list("/categories").await
    }

    pub async fn category(&self, id: &CategoryId) -> Result<Category, ClientError> {
        self.client
            .get(&Self::item_path("/categories", id.as_str()))
            .await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, ClientError> {
        payload.validate()?;
        self.client
            .send(self.client.request(Method::Post, "/categories").json(payload))
            .await
    }

    pub async fn update_category(
        &self,
        id: &CategoryId,
        payload: &CategoryPayload,
    ) -> Result<Category, ClientError> {
        payload.validate()?;
        if payload.parent_id.as_ref() == Some(id) {
            return Err(ClientError::Validation(
                "a category cannot be its own parent".to_string(),
            ));
        }
        let path = Self::item_path("/categories", id.as_str());
        self.client
            .send(self.client.request(Method::Put, &path).json(payload))
            .await
    }

    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), ClientError> {
        let path = Self::item_path("/categories", id.as_str());
        self.client
            .send_unit(self.client.request(Method::Delete, &path))
            .await
    }

    // Banners

    /// All banners in display order.
    pub async fn banners(&self) -> Result<Vec<Banner>, ClientError> {
        let mut banners: Vec<Banner> = self.client.get_list("/banners").await?;
        sort_banners(&mut banners);
        Ok(banners)
    }

    /// Banners currently shown on the storefront, in display order.
    pub async fn active_banners(&self) -> Result<Vec<Banner>, ClientError> {
        let mut banners: Vec<Banner> = self.client.get_list("/banners/active").await?;
        sort_banners(&mut banners);
        Ok(banners)
    }

    pub async fn banner(&self, id: &BannerId) -> Result<Banner, ClientError> {
        self.client
            .get(&Self::item_path("/banners", id.as_str()))
            .await
    }

    pub async fn create_banner(&self, payload: &BannerPayload) -> Result<Banner, ClientError> {
        payload.validate()?;
        self.client
            .send(self.client.request(Method::Post, "/banners").json(payload))
            .await
    }

    pub async fn update_banner(
        &self,
        id: &BannerId,
        payload: &BannerPayload,
    ) -> Result<Banner, ClientError> {
        payload.validate()?;
        let path = Self::item_path("/banners", id.as_str());
        self.client
            .send(self.client.request(Method::Put, &path).json(payload))
            .await
    }

    pub async fn delete_banner(&self, id: &BannerId) -> Result<(), ClientError> {
        let path = Self::item_path("/banners", id.as_str());
        self.client
            .send_unit(self.client.request(Method::Delete, &path))
            .await
    }

    // Complaint tickets

    /// Tickets, optionally only those filed against one order.
    pub async fn tickets(&self, order_code: Option<&str>) -> Result<Vec<Ticket>, ClientError> {
        let mut request = self.client.request(Method::Get, "/api/tickets");
        if let Some(code) = order_code.map(str::trim).filter(|c| !c.is_empty()) {
            request = request.query("orderCode", code);
        }
        Ok(self
            .client
            .send_optional::<Vec<Ticket>>(request)
            .await?
            .unwrap_or_default())
    }

    pub async fn ticket(&self, id: &TicketId) -> Result<Ticket, ClientError> {
        self.client
            .get(&Self::item_path("/api/tickets", id.as_str()))
            .await
    }

    pub async fn create_ticket(&self, payload: &TicketPayload) -> Result<Ticket, ClientError> {
        payload.validate()?;
        let ticket: Ticket = self
            .client
            .send(self.client.request(Method::Post, "/api/tickets").json(payload))
            .await?;
        info!(ticket_id = %ticket.id, "ticket filed");
        Ok(ticket)
    }

    pub async fn save_ticket_note(
        &self,
        ticket: &Ticket,
        note: Option<&str>,
    ) -> Result<Ticket, ClientError> {
        ticket.ensure_can(TicketAction::SaveNote)?;
        let path = Self::item_path("/api/tickets", ticket.id.as_str());
        self.client
            .send(
                self.client
                    .request(Method::Patch, &path)
                    .json(&TicketNote::new(note)),
            )
            .await
    }

    pub async fn resolve_ticket(
        &self,
        ticket: &Ticket,
        note: Option<&str>,
    ) -> Result<Ticket, ClientError> {
        self.ticket_transition(ticket, TicketAction::Resolve, "resolve", note)
            .await
    }

    /// Hand the ticket up to an admin.
    pub async fn escalate_ticket(
        &self,
        ticket: &Ticket,
        note: Option<&str>,
    ) -> Result<Ticket, ClientError> {
        self.ticket_transition(ticket, TicketAction::Escalate, "escalate", note)
            .await
    }

    async fn ticket_transition(
        &self,
        ticket: &Ticket,
        action: TicketAction,
        verb: &str,
        note: Option<&str>,
    ) -> Result<Ticket, ClientError> {
        ticket.ensure_can(action)?;
        let path = format!(
            "{}/{verb}",
            Self::item_path("/api/tickets", ticket.id.as_str())
        );
        let updated: Ticket = self
            .client
            .send(
                self.client
                    .request(Method::Post, &path)
                    .json(&TicketNote::new(note)),
            )
            .await?;
        info!(ticket_id = %ticket.id, status = updated.status.as_str(), "ticket {verb}d");
        Ok(updated)
    }

    // Reviews

    pub async fn reviews(&self) -> Result<Vec<Review>, ClientError> {
        self.client.get_list("/reviews").await
    }

    pub async fn reply_to_review(&self, id: &ReviewId, reply: &str) -> Result<Review, ClientError> {
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ClientError::Validation("reply is empty".to_string()));
        }
        let path = format!("{}/reply", Self::item_path("/reviews", id.as_str()));
        self.client
            .send(
                self.client
                    .request(Method::Post, &path)
                    .json(&ReviewReply { reply }),
            )
            .await
    }

    pub async fn delete_review(&self, id: &ReviewId) -> Result<(), ClientError> {
        let path = Self::item_path("/reviews", id.as_str());
        self.client
            .send_unit(self.client.request(Method::Delete, &path))
            .await
    }

    // Vouchers

    /// Approve or reject a voucher submitted by staff.
    pub async fn review_voucher(
        &self,
        id: &VoucherId,
        decision: &Decision,
    ) -> Result<Voucher, ClientError> {
        let body = VoucherApproval {
            voucher_id: id,
            action: decision.action(),
            reason: decision.reason()?,
        };
        let voucher: Voucher = self
            .client
            .send(
                self.client
                    .request(Method::Post, "/vouchers/approve")
                    .json(&body),
            )
            .await?;
        info!(voucher_id = %id, action = decision.action(), "voucher reviewed");
        Ok(voucher)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use lila_commerce::support::TicketStatus;
    use lila_commerce::voucher::VoucherStatus;
    use serde_json::json;

    fn ticket(status: &str) -> Ticket {
        serde_json::from_value(json!({
            "id": "t1",
            "orderCode": "LS0001",
            "content": "Wrong shade",
            "status": status
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_reject_needs_reason() {
        let (client, mock) = client();
        let err = client
            .backoffice()
            .review_voucher(&VoucherId::new("v1"), &Decision::reject("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_voucher_approval_body() {
        let (client, mock) = client();
        mock.ok(
            Method::Post,
            &path("/vouchers/approve"),
            json!({"id": "v1", "code": "SALE10", "status": "REJECTED"}),
        );
        let voucher = client
            .backoffice()
            .review_voucher(&VoucherId::new("v1"), &Decision::reject(" expired campaign "))
            .await
            .unwrap();
        assert_eq!(voucher.status, VoucherStatus::Rejected);
        assert_eq!(
            mock.requests()[0].json_body().unwrap(),
            json!({"voucherId": "v1", "action": "REJECT", "reason": "expired campaign"})
        );
    }

    #[tokio::test]
    async fn test_product_approval_omits_reason() {
        let (client, mock) = client();
        mock.ok(
            Method::Post,
            &path("/products/approve"),
            json!({"id": "LIP-01", "name": "Velvet", "price": 250000}),
        );
        client
            .backoffice()
            .review_product(&ProductId::new("LIP-01"), &Decision::Approve)
            .await
            .unwrap();
        assert_eq!(
            mock.requests()[0].json_body().unwrap(),
            json!({"productId": "LIP-01", "action": "APPROVE"})
        );
    }

    #[tokio::test]
    async fn test_active_banners_sorted() {
        let (client, mock) = client();
        mock.ok(
            Method::Get,
            &path("/banners/active"),
            json!([
                {"id": "b3", "title": "No order"},
                {"id": "b2", "title": "Second", "orderIndex": 2},
                {"id": "b1", "title": "First", "orderIndex": 1}
            ]),
        );
        let banners = client.backoffice().active_banners().await.unwrap();
        let ids: Vec<_> = banners.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2", "b3"]);
    }

    #[tokio::test]
    async fn test_ticket_list_filter() {
        let (client, mock) = client();
        mock.ok(Method::Get, &path("/api/tickets"), json!([]));
        client.backoffice().tickets(Some(" LS0001 ")).await.unwrap();
        assert_eq!(
            mock.requests()[0].query,
            vec![("orderCode".to_string(), "LS0001".to_string())]
        );
    }

    #[tokio::test]
    async fn test_resolve_ticket() {
        let (client, mock) = client();
        mock.ok(
            Method::Post,
            &path("/api/tickets/t1/resolve"),
            json!({"id": "t1", "content": "Wrong shade", "status": "RESOLVED"}),
        );
        let updated = client
            .backoffice()
            .resolve_ticket(&ticket("NEW"), Some("refunded"))
            .await
            .unwrap();
        assert_eq!(updated.status, TicketStatus::Resolved);
        assert_eq!(
            mock.requests()[0].json_body().unwrap(),
            json!({"handlerNote": "refunded"})
        );
    }

    #[tokio::test]
    async fn test_closed_ticket_is_refused_locally() {
        let (client, mock) = client();
        let err = client
            .backoffice()
            .escalate_ticket(&ticket("RESOLVED"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Commerce(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_reply_to_review() {
        let (client, mock) = client();
        mock.ok(
            Method::Post,
            &path("/reviews/r1/reply"),
            json!({"id": "r1", "rating": 5, "reply": "Thank you!"}),
        );
        let review = client
            .backoffice()
            .reply_to_review(&ReviewId::new("r1"), " Thank you! ")
            .await
            .unwrap();
        assert!(review.has_reply());
        assert_eq!(mock.requests()[0].json_body().unwrap(), json!({"reply": "Thank you!"}));
    }

    #[tokio::test]
    async fn test_create_category_validates() {
        let (client, mock) = client();
        let err = client
            .backoffice()
            .create_category(&CategoryPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Commerce(_)));
        assert!(mock.requests().is_empty());
    }
}
