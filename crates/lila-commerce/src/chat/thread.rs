//! The message list of one conversation.

use super::message::ChatMessage;
use super::scroll::{ScrollAction, ScrollPolicy, Viewport};
use crate::ids::UserId;

/// Whether `new` carries messages `old` did not.
///
/// Only the tail is compared: a first load always counts as new, an empty
/// reply never does, otherwise the last id changed or the list grew.
pub fn has_new_messages(old: &[ChatMessage], new: &[ChatMessage]) -> bool {
    let Some(old_last) = old.last() else {
        return true;
    };
    let Some(new_last) = new.last() else {
        return false;
    };
    new_last.id != old_last.id || new.len() > old.len()
}

/// Messages exchanged with one partner, plus the pane's scroll policy.
#[derive(Debug, Clone, Default)]
pub struct MessageThread {
    partner: Option<UserId>,
    messages: Vec<ChatMessage>,
    scroll: ScrollPolicy,
}

impl MessageThread {
    pub fn new(scroll: ScrollPolicy) -> Self {
        Self {
            partner: None,
            messages: Vec::new(),
            scroll,
        }
    }

    pub fn partner(&self) -> Option<&UserId> {
        self.partner.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn scroll(&self) -> &ScrollPolicy {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollPolicy {
        &mut self.scroll
    }

    /// Switch to `partner`. The list is cleared and auto-scroll re-armed.
    /// Returns false when `partner` was already selected.
    pub fn open(&mut self, partner: UserId) -> bool {
        if self.partner.as_ref() == Some(&partner) {
            return false;
        }
        self.partner = Some(partner);
        self.messages.clear();
        self.scroll.arm();
        true
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Forget the partner and the messages.
    pub fn reset(&mut self) {
        self.partner = None;
        self.messages.clear();
    }

    /// Replace the list with a poll result.
    ///
    /// Results for another partner (a late reply after switching) are
    /// dropped and `None` is returned.
    pub fn refresh(
        &mut self,
        partner: &UserId,
        messages: Vec<ChatMessage>,
        before: Option<&Viewport>,
    ) -> Option<ScrollAction> {
        if self.partner.as_ref() != Some(partner) {
            return None;
        }
        let has_new = has_new_messages(&self.messages, &messages);
        let action = self.scroll.on_refresh(before, has_new);
        self.messages = messages;
        Some(action)
    }

    /// Append the server's echo of a sent message; the next poll replaces
    /// the list anyway.
    pub fn push_sent(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.scroll.arm();
    }

    /// Append a locally generated message.
    pub fn push_local(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Messages the partner sent that are still unread.
    pub fn unread_from_partner(&self) -> usize {
        match &self.partner {
            Some(partner) => self
                .messages
                .iter()
                .filter(|m| m.is_from(partner) && !m.is_read())
                .count(),
            None => 0,
        }
    }
}
