//! Storefront content managed by staff: banners and product reviews.

use crate::error::CommerceError;
use crate::ids::{BannerId, ProductId, ReviewId, UserId};
use crate::serde_helpers::{lenient_date, lenient_datetime};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Where a banner is placed on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    #[default]
    Banner,
    Seasonal,
    Trending,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub content_type: BannerKind,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(default)]
    pub order_index: Option<i32>,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
}

fn default_true() -> bool {
    true
}

impl Banner {
    /// Enabled and inside its date window on `today`.
    pub fn is_live_on(&self, today: NaiveDate) -> bool {
        self.status
            && self.start_date.map_or(true, |d| today >= d)
            && self.end_date.map_or(true, |d| today <= d)
    }
}

/// Sort banners for display by `order_index`, unindexed last.
pub fn sort_banners(banners: &mut [Banner]) {
    banners.sort_by_key(|b| (b.order_index.is_none(), b.order_index.unwrap_or(0)));
}

/// Create/update body for `/banners`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPayload {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub content_type: BannerKind,
    pub status: bool,
    pub order_index: Option<i32>,
    pub product_ids: Vec<ProductId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BannerPayload {
    /// Field rules the backend enforces on create and update.
    pub fn validate(&self) -> Result<(), CommerceError> {
        let invalid = |msg: &str| Err(CommerceError::ValidationError(msg.to_string()));
        if self.title.trim().is_empty() {
            return invalid("banner title is required");
        }
        if self.title.chars().count() > 255 {
            return invalid("banner title exceeds 255 characters");
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > 1000)
        {
            return invalid("banner description exceeds 1000 characters");
        }
        if self.image_url.trim().is_empty() {
            return invalid("banner image URL is required");
        }
        if self.order_index.is_some_and(|i| i < 0) {
            return invalid("banner order index must be non-negative");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return invalid("banner end date is before its start date");
            }
        }
        Ok(())
    }
}

impl From<&Banner> for BannerPayload {
    fn from(b: &Banner) -> Self {
        Self {
            title: b.title.clone(),
            description: b.description.clone(),
            image_url: b.image_url.clone().unwrap_or_default(),
            link_url: b.link_url.clone(),
            content_type: b.content_type.clone(),
            status: b.status,
            order_index: b.order_index,
            product_ids: b.product_ids.clone(),
            start_date: b.start_date,
            end_date: b.end_date,
        }
    }
}

/// A product review with an optional staff reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub name_display: Option<String>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub reply_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: Option<String>,
}

impl Review {
    pub fn author(&self) -> &str {
        [self.user_name.as_deref(), self.name_display.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or("Customer")
    }

    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Case-insensitive match on product name, author or comment.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return true;
        }
        [
            self.product_name.as_deref(),
            Some(self.author()),
            self.comment.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&keyword))
    }
}

/// Reply filter on the moderation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFilter {
    #[default]
    All,
    WithReply,
    NoReply,
}

impl ReplyFilter {
    pub fn accepts(&self, review: &Review) -> bool {
        match self {
            ReplyFilter::All => true,
            ReplyFilter::WithReply => review.has_reply(),
            ReplyFilter::NoReply => !review.has_reply(),
        }
    }
}

/// Body for posting a new review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    pub product_id: ProductId,
    pub name_display: Option<String>,
    pub rating: u8,
    pub comment: Option<String>,
}

impl ReviewPayload {
    pub fn validate(&self) -> Result<(), CommerceError> {
        if !(1..=5).contains(&self.rating) {
            return Err(CommerceError::ValidationError(
                "rating must be between 1 and 5 stars".into(),
            ));
        }
        if self
            .name_display
            .as_deref()
            .is_some_and(|n| n.chars().count() > 100)
        {
            return Err(CommerceError::ValidationError(
                "display name exceeds 100 characters".into(),
            ));
        }
        if self
            .comment
            .as_deref()
            .is_some_and(|c| c.chars().count() > 1000)
        {
            return Err(CommerceError::ValidationError(
                "comment exceeds 1000 characters".into(),
            ));
        }
        Ok(())
    }
}
