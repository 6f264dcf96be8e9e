//! Chat messages and conversation summaries.

use crate::ids::{MessageId, UserId};
use crate::serde_helpers::{lenient_bool, lenient_datetime};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender id used for locally generated system messages.
pub const SYSTEM_SENDER: &str = "system";

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    #[serde(default, alias = "content")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_bool", alias = "read")]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub is_system_message: bool,
}

impl ChatMessage {
    /// A locally generated message that never reaches the backend.
    pub fn system(notice: SystemNotice, at: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(format!("{}-{}", notice.id_prefix(), at.timestamp_millis())),
            sender_id: UserId::new(SYSTEM_SENDER),
            receiver_id: None,
            message: notice.body().to_string(),
            created_at: Some(at.naive_utc()),
            is_read: Some(true),
            is_system_message: true,
        }
    }

    pub fn is_system(&self) -> bool {
        self.is_system_message || self.sender_id.as_str() == SYSTEM_SENDER
    }

    /// Whether `user` wrote this message. Ids are compared as trimmed text
    /// since the backend mixes numeric and string ids.
    pub fn is_from(&self, user: &UserId) -> bool {
        !self.is_system() && self.sender_id.as_str().trim() == user.as_str().trim()
    }

    pub fn is_read(&self) -> bool {
        self.is_read.unwrap_or(false)
    }
}

/// Canned answers the widget can drop into the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemNotice {
    Policies,
    Faq,
}

impl SystemNotice {
    fn id_prefix(&self) -> &'static str {
        match self {
            SystemNotice::Policies => "policy",
            SystemNotice::Faq => "faq",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            SystemNotice::Policies => POLICIES,
            SystemNotice::Faq => FAQ,
        }
    }
}

const POLICIES: &str = "\
PURCHASE POLICIES

Shipping:
- Free shipping on orders from 500.000 ₫
- Delivery within 2-5 business days
- Express delivery available inside the city

Returns:
- Returns accepted within 7 days of delivery
- Products must be unused and in their original packaging
- Free returns for manufacturer defects

Payment:
- Cash on delivery (COD)
- Bank transfer
- Credit or debit card
- E-wallets (MoMo, ZaloPay, ShopeePay)

Warranty:
- Official warranty per product
- Service at authorized centers
- Replacement within 30 days for manufacturer defects

Any questions about our policies? A support agent will help you right away.";

const FAQ: &str = "\
FREQUENTLY ASKED QUESTIONS

1. How do I place an order?
   Order directly on the website or call the hotline 1900-123-456.

2. How long does delivery take?
   Usually 2-5 business days depending on the area.

3. Can I return a product?
   Yes, within 7 days of delivery if the product is intact.

4. Which payment methods are accepted?
   COD, bank transfer, credit cards and e-wallets.

5. Are products covered by warranty?
   Yes, every product carries the manufacturer's warranty.

Need more help? Chat with an agent for details.";

/// One row of the support inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub partner_id: UserId,
    #[serde(default)]
    pub partner_name: Option<String>,
    #[serde(default)]
    pub partner_email: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_datetime",
        alias = "lastMessageAt"
    )]
    pub last_message_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// Name, then email, then the raw partner id.
    pub fn display_name(&self) -> &str {
        [self.partner_name.as_deref(), self.partner_email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(self.partner_id.as_str())
    }

    /// Avatar letter.
    pub fn initial(&self) -> char {
        self.partner_name
            .as_deref()
            .and_then(|n| n.trim().chars().next())
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('U')
    }

    pub fn badge(&self) -> Option<String> {
        unread_badge(self.unread_count)
    }
}

/// Badge text for an unread counter; hidden at zero.
pub fn unread_badge(count: u32) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}

/// Coarse "how long ago" label for inbox rows.
pub fn relative_time(at: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now - at;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 24 {
        format!("{hours} h ago")
    } else if days < 7 {
        format!("{days} d ago")
    } else {
        at.format("%d/%m/%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_message_from_backend() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "id": 41,
            "senderId": 7,
            "receiverId": "12",
            "message": "Xin chào",
            "createdAt": "2025-06-01T08:30:00",
            "isRead": 0
        }))
        .unwrap();
        assert_eq!(msg.id.as_str(), "41");
        assert!(msg.is_from(&UserId::new(" 7 ")));
        assert!(!msg.is_from(&UserId::new("12")));
        assert!(!msg.is_read());
        assert_eq!(msg.created_at, Some(at(8, 30)));
    }

    #[test]
    fn test_system_message() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 1, 2, 3).unwrap();
        let msg = ChatMessage::system(SystemNotice::Policies, now);
        assert_eq!(msg.id.as_str(), format!("policy-{}", now.timestamp_millis()));
        assert_eq!(msg.sender_id.as_str(), SYSTEM_SENDER);
        assert!(msg.is_system());
        assert!(!msg.is_from(&UserId::new("system")));

        let faq = ChatMessage::system(SystemNotice::Faq, now);
        assert!(faq.id.as_str().starts_with("faq-"));
    }

    #[test]
    fn test_unread_badge() {
        assert_eq!(unread_badge(0), None);
        assert_eq!(unread_badge(5).as_deref(), Some("5"));
        assert_eq!(unread_badge(99).as_deref(), Some("99"));
        assert_eq!(unread_badge(100).as_deref(), Some("99+"));
    }

    #[test]
    fn test_conversation_display_name() {
        let conv: Conversation = serde_json::from_value(json!({
            "partnerId": 3, "partnerName": " ", "partnerEmail": "lan@lila.vn", "unreadCount": 2
        }))
        .unwrap();
        assert_eq!(conv.display_name(), "lan@lila.vn");
        assert_eq!(conv.initial(), 'U');
        assert_eq!(conv.badge().as_deref(), Some("2"));

        let conv: Conversation =
            serde_json::from_value(json!({"partnerId": "3", "partnerName": "lan"})).unwrap();
        assert_eq!(conv.initial(), 'L');
        assert_eq!(conv.unread_count, 0);
    }

    #[test]
    fn test_relative_time() {
        let now = at(12, 0);
        assert_eq!(relative_time(at(11, 59), now), "1 min ago");
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(at(9, 0), now), "3 h ago");
        let old = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(relative_time(old, now), "01/05/2025");
    }
}
