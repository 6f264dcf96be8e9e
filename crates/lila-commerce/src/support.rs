//! Complaint tickets handled by customer support.

use crate::error::CommerceError;
use crate::ids::{TicketId, UserId};
use crate::serde_helpers::lenient_datetime;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    /// Handed over to an administrator.
    Escalated,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "NEW",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Escalated => "ESCALATED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::New => "Pending",
            TicketStatus::InProgress => "In progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Escalated => "Escalated to admin",
        }
    }

    /// Resolved tickets accept no further action.
    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Resolved)
    }
}

/// Who currently owns a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketAssignee {
    #[default]
    CustomerSupport,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub handler_note: Option<String>,
    #[serde(default)]
    pub handler_id: Option<UserId>,
    #[serde(default)]
    pub handler_name: Option<String>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub assigned_to: Option<TicketAssignee>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Ticket {
    /// Check that `action` is allowed in the ticket's current state.
    pub fn ensure_can(&self, action: TicketAction) -> Result<(), CommerceError> {
        let allowed = match action {
            TicketAction::SaveNote => !self.status.is_closed(),
            TicketAction::Resolve => !self.status.is_closed(),
            TicketAction::Escalate => {
                !self.status.is_closed() && self.status != TicketStatus::Escalated
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(CommerceError::ValidationError(format!(
                "cannot {} a ticket that is {}",
                action.as_str(),
                self.status.as_str()
            )))
        }
    }

    /// Case-insensitive match on order code, customer, email or content.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return true;
        }
        [
            self.order_code.as_deref(),
            self.customer_name.as_deref(),
            self.email.as_deref(),
            Some(self.content.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&keyword))
    }

    pub fn created_on(&self, day: NaiveDate) -> bool {
        self.created_at.is_some_and(|at| at.date() == day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    SaveNote,
    Resolve,
    Escalate,
}

impl TicketAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketAction::SaveNote => "annotate",
            TicketAction::Resolve => "resolve",
            TicketAction::Escalate => "escalate",
        }
    }
}

/// Body for `POST /api/tickets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    pub order_code: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub content: String,
}

impl TicketPayload {
    pub fn validate(&self) -> Result<(), CommerceError> {
        let fields = [
            ("order code", &self.order_code),
            ("customer name", &self.customer_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("content", &self.content),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CommerceError::ValidationError(format!("{name} is required")));
        }
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(CommerceError::ValidationError(format!(
                "invalid email: {email}"
            )));
        }
        Ok(())
    }
}

/// Body for the note, resolve and escalate calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_note: Option<String>,
}

impl TicketNote {
    /// Blank notes are omitted from the body.
    pub fn new(note: Option<&str>) -> Self {
        Self {
            handler_note: note
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(status: &str) -> Ticket {
        serde_json::from_value(json!({
            "id": "t1",
            "orderCode": "LILA-100",
            "customerName": "Ngọc",
            "email": "ngoc@lila.vn",
            "content": "Package arrived damaged",
            "status": status,
            "assignedTo": "CUSTOMER_SUPPORT",
            "createdAt": "2025-06-02T10:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_ticket_decode() {
        let t = ticket("IN_PROGRESS");
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.assigned_to, Some(TicketAssignee::CustomerSupport));
        assert!(t.created_on(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()));
    }

    #[test]
    fn test_ticket_actions() {
        assert!(ticket("NEW").ensure_can(TicketAction::Escalate).is_ok());
        assert!(ticket("ESCALATED").ensure_can(TicketAction::Escalate).is_err());
        assert!(ticket("ESCALATED").ensure_can(TicketAction::Resolve).is_ok());
        assert!(ticket("RESOLVED").ensure_can(TicketAction::SaveNote).is_err());
    }

    #[test]
    fn test_ticket_search() {
        let t = ticket("NEW");
        assert!(t.matches("lila-100"));
        assert!(t.matches("damaged"));
        assert!(!t.matches("refund"));
    }

    #[test]
    fn test_ticket_payload() {
        let mut p = TicketPayload {
            order_code: "LILA-1".into(),
            customer_name: "An".into(),
            email: "an@lila.vn".into(),
            phone: "0901234567".into(),
            content: "Wrong shade".into(),
        };
        assert!(p.validate().is_ok());
        p.email = "not-an-email".into();
        assert!(p.validate().is_err());
        p.email = "an@lila.vn".into();
        p.content = " ".into();
        assert_eq!(
            p.validate(),
            Err(CommerceError::ValidationError("content is required".into()))
        );
    }

    #[test]
    fn test_blank_note_omitted() {
        let body = serde_json::to_value(TicketNote::new(Some("  "))).unwrap();
        assert_eq!(body, json!({}));
        let body = serde_json::to_value(TicketNote::new(Some(" called back "))).unwrap();
        assert_eq!(body, json!({"handlerNote": "called back"}));
    }
}
