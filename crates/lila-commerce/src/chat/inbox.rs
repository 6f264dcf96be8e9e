//! Support-staff inbox: the conversation list plus the open thread.

use super::message::{ChatMessage, Conversation};
use super::scroll::{ScrollAction, ScrollPolicy, Viewport};
use super::thread::MessageThread;
use crate::ids::UserId;

#[derive(Debug, Clone, Default)]
pub struct SupportInbox {
    conversations: Vec<Conversation>,
    selected: Option<Conversation>,
    thread: MessageThread,
}

impl SupportInbox {
    pub fn new(scroll: ScrollPolicy) -> Self {
        Self {
            thread: MessageThread::new(scroll),
            ..Self::default()
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected(&self) -> Option<&Conversation> {
        self.selected.as_ref()
    }

    pub fn selected_partner(&self) -> Option<&UserId> {
        self.selected.as_ref().map(|c| &c.partner_id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.thread.messages()
    }

    pub fn thread(&self) -> &MessageThread {
        &self.thread
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    /// Replace the list. The selected row is refreshed from the new list
    /// when it is still there.
    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        if let Some(selected) = &mut self.selected {
            if let Some(updated) = conversations
                .iter()
                .find(|c| c.partner_id == selected.partner_id)
            {
                *selected = updated.clone();
            }
        }
        self.conversations = conversations;
    }

    /// Empty the list after a failed or unauthorized load.
    pub fn clear_conversations(&mut self) {
        self.conversations.clear();
    }

    /// Select a conversation. Returns true when the selection changed, in
    /// which case the caller loads it and marks it read.
    pub fn select(&mut self, conversation: Conversation) -> bool {
        let changed = self.thread.open(conversation.partner_id.clone());
        self.selected = Some(conversation);
        changed
    }

    /// Select by partner id from the current list.
    pub fn select_partner(&mut self, partner: &UserId) -> bool {
        match self.conversations.iter().find(|c| &c.partner_id == partner) {
            Some(conversation) => {
                let conversation = conversation.clone();
                self.select(conversation)
            }
            None => false,
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.thread.reset();
    }

    pub fn on_user_scroll(&mut self, viewport: &Viewport) {
        self.thread.scroll_mut().on_user_scroll(viewport);
    }

    pub fn on_messages(
        &mut self,
        partner: &UserId,
        messages: Vec<ChatMessage>,
        before: Option<&Viewport>,
    ) -> Option<ScrollAction> {
        self.thread.refresh(partner, messages, before)
    }

    pub fn on_sent(&mut self, message: ChatMessage) {
        if self.selected.is_some() {
            self.thread.push_sent(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conv(id: &str, unread: u32, last: &str) -> Conversation {
        serde_json::from_value(json!({
            "partnerId": id,
            "partnerName": format!("Customer {id}"),
            "lastMessage": last,
            "unreadCount": unread,
        }))
        .unwrap()
    }

    #[test]
    fn test_selected_refreshed_from_list() {
        let mut inbox = SupportInbox::default();
        inbox.set_conversations(vec![conv("1", 2, "hi"), conv("2", 0, "ok")]);
        assert!(inbox.select_partner(&UserId::new("1")));
        assert_eq!(inbox.total_unread(), 2);

        inbox.set_conversations(vec![conv("1", 0, "thanks"), conv("2", 1, "ok")]);
        let selected = inbox.selected().unwrap();
        assert_eq!(selected.last_message.as_deref(), Some("thanks"));
        assert_eq!(selected.unread_count, 0);
    }

    #[test]
    fn test_selection_survives_missing_row() {
        let mut inbox = SupportInbox::default();
        inbox.set_conversations(vec![conv("1", 0, "hi")]);
        inbox.select_partner(&UserId::new("1"));
        inbox.set_conversations(vec![conv("2", 0, "yo")]);
        assert_eq!(inbox.selected_partner().map(UserId::as_str), Some("1"));
    }

    #[test]
    fn test_reselecting_same_partner_keeps_thread() {
        let mut inbox = SupportInbox::default();
        inbox.set_conversations(vec![conv("1", 0, "hi")]);
        assert!(inbox.select_partner(&UserId::new("1")));
        assert!(!inbox.select_partner(&UserId::new("1")));
        assert!(!inbox.select_partner(&UserId::new("404")));
    }

    #[test]
    fn test_deselect() {
        let mut inbox = SupportInbox::default();
        inbox.set_conversations(vec![conv("1", 0, "hi")]);
        inbox.select_partner(&UserId::new("1"));
        inbox.deselect();
        assert!(inbox.selected().is_none());
        assert!(inbox.thread().partner().is_none());
    }
}
