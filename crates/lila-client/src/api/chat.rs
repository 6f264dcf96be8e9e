use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::chat::{ChatMessage, Conversation};
use lila_commerce::user::UserProfile;
use lila_commerce::UserId;
use lila_data::Method;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessage<'a> {
    receiver_id: &'a UserId,
    message: &'a str,
}

/// Chat between customers and support staff.
pub struct ChatApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ChatApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Messages exchanged with `partner`, oldest first.
    pub async fn conversation(&self, partner: &UserId) -> Result<Vec<ChatMessage>, ClientError> {
        self.client
            .get_list(&format!("/chat/conversation/{}", segment(partner.as_str())))
            .await
    }

    /// Conversation summaries for the signed-in user.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        self.client.get_list("/chat/conversations").await
    }

    pub async fn send(&self, receiver: &UserId, text: &str) -> Result<ChatMessage, ClientError> {
        let body = SendMessage {
            receiver_id: receiver,
            message: text,
        };
        self.client
            .send(self.client.request(Method::Post, "/chat/send").json(&body))
            .await
    }

    /// Mark everything from `partner` as read.
    pub async fn mark_read(&self, partner: &UserId) -> Result<(), ClientError> {
        let path = format!("/chat/read/{}", segment(partner.as_str()));
        self.client
            .send_unit(self.client.request(Method::Put, &path))
            .await
    }

    /// Total unread messages; anything but a number reads as zero.
    pub async fn unread_count(&self) -> Result<u32, ClientError> {
        let count: Option<serde_json::Value> = self
            .client
            .send_optional(self.client.request(Method::Get, "/chat/unread-count"))
            .await?;
        Ok(count
            .and_then(|v| v.as_u64())
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0))
    }

    /// The support agent new customer conversations are routed to.
    pub async fn first_customer_support(&self) -> Result<UserProfile, ClientError> {
        let agent: Option<UserProfile> = self
            .client
            .send_optional(self.client.request(Method::Get, "/chat/first-customer-support"))
            .await?;
        agent
            .filter(|a| !a.id.as_str().trim().is_empty())
            .ok_or_else(|| ClientError::NotFound("customer support agent".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_conversation_messages() {
        let (client, mock) = client();
        mock.ok(
            Method::Get,
            &path("/chat/conversation/42"),
            json!([
                {"id": 1, "senderId": 7, "receiverId": 42, "message": "hi", "createdAt": "2025-06-01T10:00:00", "isRead": true},
                {"id": 2, "senderId": 42, "message": "hello"}
            ]),
        );
        let messages = client.chat().conversation(&UserId::new("42")).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_from(&UserId::new("7")));
        assert!(!messages[1].is_read());
    }

    #[tokio::test]
    async fn test_send_body() {
        let (client, mock) = client();
        mock.ok(
            Method::Post,
            &path("/chat/send"),
            json!({"id": 3, "senderId": 7, "receiverId": 42, "message": "xin chào"}),
        );
        let sent = client.chat().send(&UserId::new("42"), "xin chào").await.unwrap();
        assert_eq!(sent.message, "xin chào");
        assert_eq!(
            mock.requests()[0].json_body().unwrap(),
            json!({"receiverId": "42", "message": "xin chào"})
        );
    }

    #[tokio::test]
    async fn test_unread_count_tolerates_junk() {
        let (client, mock) = client();
        mock.ok(Method::Get, &path("/chat/unread-count"), json!(5))
            .ok(Method::Get, &path("/chat/unread-count"), json!("five"));
        assert_eq!(client.chat().unread_count().await.unwrap(), 5);
        assert_eq!(client.chat().unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_first_customer_support_missing() {
        let (client, mock) = client();
        mock.ok(Method::Get, &path("/chat/first-customer-support"), json!(null));
        let err = client.chat().first_customer_support().await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_read_unauthorized() {
        let (client, mock) = client();
        mock.status(Method::Put, &path("/chat/read/42"), 401);
        let err = client.chat().mark_read(&UserId::new("42")).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
