//! Customer chat widget state machine.
//!
//! ```text
//! Closed --open--> Menu --enter_chat--> Chat
//!                   ^                    |
//!                   +---back_to_menu-----+
//! any --close/unauthorized--> Closed
//! ```

use super::message::{unread_badge, ChatMessage, SystemNotice};
use super::scroll::{ScrollAction, ScrollPolicy, Viewport};
use super::thread::MessageThread;
use crate::error::CommerceError;
use crate::ids::UserId;
use crate::user::{Role, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which panel of the widget is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatView {
    #[default]
    Closed,
    Menu,
    Chat,
}

impl ChatView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatView::Closed => "closed",
            ChatView::Menu => "menu",
            ChatView::Chat => "chat",
        }
    }
}

/// Whether the floating chat button is rendered for `role`.
pub fn widget_visible_for(role: Option<&Role>) -> bool {
    !role.is_some_and(Role::is_back_office)
}

/// State of the customer's chat widget.
#[derive(Debug, Clone, Default)]
pub struct ChatWidget {
    view: ChatView,
    owner: Option<UserId>,
    thread: MessageThread,
    unread: u32,
}

impl ChatWidget {
    pub fn new(scroll: ScrollPolicy) -> Self {
        Self {
            thread: MessageThread::new(scroll),
            ..Self::default()
        }
    }

    pub fn view(&self) -> ChatView {
        self.view
    }

    pub fn is_open(&self) -> bool {
        self.view != ChatView::Closed
    }

    pub fn partner(&self) -> Option<&UserId> {
        self.thread.partner()
    }

    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.thread.messages()
    }

    pub fn thread(&self) -> &MessageThread {
        &self.thread
    }

    /// Forward a scroll event from the message pane.
    pub fn on_user_scroll(&mut self, viewport: &Viewport) {
        self.thread.scroll_mut().on_user_scroll(viewport);
    }

    /// Open the widget on its menu.
    ///
    /// Only a signed-in customer may chat. A refusal leaves the widget
    /// closed.
    pub fn open(&mut self, user: Option<&UserProfile>) -> Result<(), CommerceError> {
        self.thread.reset();
        let user = match user {
            Some(user) => user,
            None => {
                self.view = ChatView::Closed;
                return Err(CommerceError::NotSignedIn);
            }
        };
        if user.role != Role::Customer {
            self.view = ChatView::Closed;
            return Err(CommerceError::RoleNotPermitted(user.role.to_string()));
        }
        self.set_owner(user.id.clone());
        self.view = ChatView::Menu;
        Ok(())
    }

    /// A different account signed in: drop the previous account's thread.
    pub fn set_owner(&mut self, owner: UserId) {
        if self.owner.as_ref() != Some(&owner) {
            self.thread.reset();
            self.owner = Some(owner);
        }
    }

    /// Switch to the conversation panel. The list is cleared and the next
    /// load scrolls to the bottom; the caller looks up a support agent when
    /// [`needs_partner`](Self::needs_partner).
    pub fn enter_chat(&mut self) -> Result<(), CommerceError> {
        self.require_open(ChatView::Chat)?;
        self.thread.clear();
        self.thread.scroll_mut().arm();
        self.view = ChatView::Chat;
        Ok(())
    }

    pub fn needs_partner(&self) -> bool {
        self.view == ChatView::Chat && self.thread.partner().is_none()
    }

    /// Chat with `partner`. Switching partners clears the list and re-arms
    /// auto-scroll.
    pub fn set_partner(&mut self, partner: UserId) -> Result<(), CommerceError> {
        self.require_open(ChatView::Chat)?;
        self.thread.open(partner);
        Ok(())
    }

    pub fn back_to_menu(&mut self) -> Result<(), CommerceError> {
        if self.view != ChatView::Chat {
            return Err(self.transition_error(ChatView::Menu));
        }
        self.view = ChatView::Menu;
        Ok(())
    }

    /// Close the widget, dropping partner and messages.
    pub fn close(&mut self) {
        self.view = ChatView::Closed;
        self.thread.reset();
    }

    /// The session expired: close without re-authenticating.
    pub fn on_unauthorized(&mut self) {
        self.close();
    }

    /// Show a canned answer in the conversation panel.
    pub fn show_notice(&mut self, notice: SystemNotice, now: DateTime<Utc>) -> Result<(), CommerceError> {
        if self.view != ChatView::Chat {
            self.enter_chat()?;
        }
        self.thread.push_local(ChatMessage::system(notice, now));
        self.thread.scroll_mut().arm();
        Ok(())
    }

    /// Whether the 3 s message poll should run.
    pub fn should_poll_messages(&self) -> bool {
        self.view == ChatView::Chat && self.thread.partner().is_some()
    }

    /// Apply a conversation poll result.
    pub fn on_messages(
        &mut self,
        partner: &UserId,
        messages: Vec<ChatMessage>,
        before: Option<&Viewport>,
    ) -> Option<ScrollAction> {
        if self.view != ChatView::Chat {
            return None;
        }
        self.thread.refresh(partner, messages, before)
    }

    /// Validate outgoing text; returns the trimmed message and its receiver.
    pub fn prepare_send(&self, text: &str) -> Result<(String, UserId), CommerceError> {
        let partner = self
            .thread
            .partner()
            .cloned()
            .ok_or_else(|| CommerceError::ValidationError("no support agent selected".into()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CommerceError::ValidationError("message is empty".into()));
        }
        Ok((text.to_string(), partner))
    }

    /// Record the server's echo of a sent message.
    pub fn on_sent(&mut self, message: ChatMessage) {
        if self.view == ChatView::Chat {
            self.thread.push_sent(message);
        }
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }

    pub fn set_unread(&mut self, count: u32) {
        self.unread = count;
    }

    pub fn unread_badge(&self) -> Option<String> {
        unread_badge(self.unread)
    }

    fn require_open(&self, to: ChatView) -> Result<(), CommerceError> {
        if self.view == ChatView::Closed {
            return Err(self.transition_error(to));
        }
        Ok(())
    }

    fn transition_error(&self, to: ChatView) -> CommerceError {
        CommerceError::InvalidChatTransition {
            from: self.view.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}
