//! The customer's chat widget, polled for messages and the unread badge.

use super::{lock, spawn_loops, ticker, Lifecycle, PollerHandle, EVENT_CAPACITY};
use crate::api::ApiClient;
use crate::config::ChatConfig;
use crate::error::ClientError;
use crate::inflight::InFlight;
use chrono::Utc;
use lila_commerce::chat::{
    has_new_messages, ChatMessage, ChatView, ChatWidget, ScrollAction, ScrollPolicy,
    SystemNotice, Viewport,
};
use lila_commerce::user::UserProfile;
use lila_commerce::UserId;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// What a [`ChatPoller`] tells its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The open conversation has new messages, or an armed scroll to the
    /// bottom (conversation opened, message sent) was applied.
    Messages {
        partner: UserId,
        messages: Vec<ChatMessage>,
        scroll: ScrollAction,
    },
    /// The unread count changed.
    Unread(u32),
    /// A request came back 401: the widget closed and polling stopped.
    SessionExpired,
}

#[derive(Debug)]
struct Shared {
    api: ApiClient,
    config: ChatConfig,
    widget: Mutex<ChatWidget>,
    viewport: Mutex<Option<Viewport>>,
    /// Partner whose conversation was marked read since it was opened.
    read_marked: Mutex<Option<UserId>>,
    messages_busy: AtomicBool,
    unread_busy: AtomicBool,
    lifecycle: Arc<Lifecycle>,
    events: broadcast::Sender<ChatEvent>,
}

/// Drives a [`ChatWidget`] against the backend.
///
/// Cloning is cheap and every clone drives the same widget.
#[derive(Debug, Clone)]
pub struct ChatPoller {
    shared: Arc<Shared>,
}

impl ChatPoller {
    pub fn new(api: ApiClient, config: ChatConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let widget = ChatWidget::new(ScrollPolicy::with_threshold(config.near_bottom_px));
        Self {
            shared: Arc::new(Shared {
                api,
                config,
                widget: Mutex::new(widget),
                viewport: Mutex::new(None),
                read_marked: Mutex::new(None),
                messages_busy: AtomicBool::new(false),
                unread_busy: AtomicBool::new(false),
                lifecycle: Arc::new(Lifecycle::new()),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.shared.events.subscribe()
    }

    /// Start the message and unread loops.
    pub fn start(&self) -> PollerHandle {
        let config = &self.shared.config;
        let messages = self.clone();
        let unread = self.clone();
        spawn_loops(
            &self.shared.lifecycle,
            vec![
                (
                    "chat-messages",
                    config.message_interval(),
                    ticker(move || {
                        let poller = messages.clone();
                        async move { poller.refresh_messages().await.map(drop) }
                    }),
                ),
                (
                    "chat-unread",
                    config.unread_interval(),
                    ticker(move || {
                        let poller = unread.clone();
                        async move { poller.refresh_unread().await.map(drop) }
                    }),
                ),
            ],
        )
    }

    /// Pause or resume polling, e.g. while the page is in the background.
    pub fn set_visible(&self, visible: bool) {
        self.shared.lifecycle.set_visible(visible);
    }

    pub fn view(&self) -> ChatView {
        lock(&self.shared.widget).view()
    }

    pub fn partner(&self) -> Option<UserId> {
        lock(&self.shared.widget).partner().cloned()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.shared.widget).messages().to_vec()
    }

    pub fn unread(&self) -> u32 {
        lock(&self.shared.widget).unread()
    }

    pub fn unread_badge(&self) -> Option<String> {
        lock(&self.shared.widget).unread_badge()
    }

    /// Open the widget for `user`; only signed-in customers may chat.
    pub fn open(&self, user: Option<&UserProfile>) -> Result<(), ClientError> {
        lock(&self.shared.widget).open(user)?;
        *lock(&self.shared.read_marked) = None;
        Ok(())
    }

    /// Enter the conversation panel, assigning a support agent the first
    /// time. The conversation is marked read and loaded.
    pub async fn start_chat(&self) -> Result<UserId, ClientError> {
        let needs_partner = {
            let mut widget = lock(&self.shared.widget);
            widget.enter_chat()?;
            widget.needs_partner()
        };
        self.forget_viewport();
        if needs_partner {
            let agent = self.session(self.shared.api.chat().first_customer_support().await)?;
            lock(&self.shared.widget).set_partner(agent.id.clone())?;
            info!(partner_id = %agent.id, "support agent assigned");
        }
        let partner = self
            .partner()
            .ok_or_else(|| ClientError::NotFound("customer support agent".to_string()))?;
        self.open_conversation(&partner).await?;
        Ok(partner)
    }

    /// Chat with a specific partner instead of the assigned agent. From the
    /// menu this enters the conversation panel first.
    pub async fn select_partner(&self, partner: UserId) -> Result<(), ClientError> {
        {
            let mut widget = lock(&self.shared.widget);
            if widget.view() != ChatView::Chat {
                widget.enter_chat()?;
            }
            widget.set_partner(partner.clone())?;
        }
        self.forget_viewport();
        self.open_conversation(&partner).await
    }

    async fn open_conversation(&self, partner: &UserId) -> Result<(), ClientError> {
        self.mark_read_once(partner).await?;
        self.refresh_messages().await?;
        Ok(())
    }

    async fn mark_read_once(&self, partner: &UserId) -> Result<(), ClientError> {
        if lock(&self.shared.read_marked).as_ref() == Some(partner) {
            return Ok(());
        }
        match self.session(self.shared.api.chat().mark_read(partner).await) {
            Ok(()) => {
                *lock(&self.shared.read_marked) = Some(partner.clone());
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                warn!(partner_id = %partner, error = %e, "could not mark conversation read");
                Ok(())
            }
        }
    }

    pub fn back_to_menu(&self) -> Result<(), ClientError> {
        lock(&self.shared.widget).back_to_menu()?;
        self.forget_viewport();
        Ok(())
    }

    pub fn close(&self) {
        lock(&self.shared.widget).close();
        *lock(&self.shared.read_marked) = None;
        self.forget_viewport();
    }

    /// Drop a canned policies or FAQ answer into the conversation.
    pub fn show_notice(&self, notice: SystemNotice) -> Result<(), ClientError> {
        lock(&self.shared.widget).show_notice(notice, Utc::now())?;
        Ok(())
    }

    /// Record where the message pane is scrolled.
    pub fn set_viewport(&self, viewport: Viewport) {
        lock(&self.shared.widget).on_user_scroll(&viewport);
        *lock(&self.shared.viewport) = Some(viewport);
    }

    /// The message pane unmounted; the next load starts from an empty pane.
    fn forget_viewport(&self) {
        *lock(&self.shared.viewport) = None;
    }

    /// Send `text` to the current partner.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ClientError> {
        let (text, partner) = lock(&self.shared.widget).prepare_send(text)?;
        let sent = self.session(self.shared.api.chat().send(&partner, &text).await)?;
        lock(&self.shared.widget).on_sent(sent.clone());
        debug!(partner_id = %partner, "message sent");
        Ok(sent)
    }

    /// One message poll. Returns the scroll action when the list was
    /// refreshed, `None` when the tick was skipped.
    pub async fn refresh_messages(&self) -> Result<Option<ScrollAction>, ClientError> {
        let shared = &self.shared;
        if !shared.lifecycle.is_active() {
            return Ok(None);
        }
        let partner = {
            let widget = lock(&shared.widget);
            if !widget.should_poll_messages() {
                return Ok(None);
            }
            widget.partner().cloned()
        };
        let Some(partner) = partner else {
            return Ok(None);
        };
        let Some(_flight) = InFlight::try_start(&shared.messages_busy) else {
            debug!(partner_id = %partner, "message poll still running, tick skipped");
            return Ok(None);
        };

        let messages = self.session(shared.api.chat().conversation(&partner).await)?;
        if shared.lifecycle.is_stopped() {
            return Ok(None);
        }

        let before = *lock(&shared.viewport);
        let (action, fresh) = {
            let mut widget = lock(&shared.widget);
            let fresh = has_new_messages(widget.messages(), &messages);
            let action = widget.on_messages(&partner, messages.clone(), before.as_ref());
            (action, fresh)
        };
        // An armed scroll (conversation opened, message sent) is reported
        // even when the list did not change.
        let notify = |scroll: &ScrollAction| fresh || *scroll == ScrollAction::ToBottom;
        if let Some(scroll) = action.filter(notify) {
            debug!(partner_id = %partner, count = messages.len(), ?scroll, "messages refreshed");
            self.emit(ChatEvent::Messages {
                partner,
                messages,
                scroll,
            });
        }
        Ok(action)
    }

    /// One unread-count poll. Skipped while signed out.
    pub async fn refresh_unread(&self) -> Result<Option<u32>, ClientError> {
        let shared = &self.shared;
        if !shared.lifecycle.is_active() || !shared.api.is_signed_in() {
            return Ok(None);
        }
        let Some(_flight) = InFlight::try_start(&shared.unread_busy) else {
            return Ok(None);
        };

        let count = self.session(shared.api.chat().unread_count().await)?;
        if shared.lifecycle.is_stopped() {
            return Ok(None);
        }
        let changed = {
            let mut widget = lock(&shared.widget);
            let changed = widget.unread() != count;
            widget.set_unread(count);
            changed
        };
        if changed {
            self.emit(ChatEvent::Unread(count));
        }
        Ok(Some(count))
    }

    /// Pass a result through, tearing the widget down on a 401.
    fn session<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.expire();
            }
        }
        result
    }

    fn expire(&self) {
        let first = !self.shared.lifecycle.is_stopped();
        lock(&self.shared.widget).on_unauthorized();
        *lock(&self.shared.read_marked) = None;
        self.forget_viewport();
        self.shared.lifecycle.stop();
        if first {
            warn!("chat session expired, polling stopped");
            self.emit(ChatEvent::SessionExpired);
        }
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.shared.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{client, path};
    use lila_commerce::user::Role;
    use lila_data::{MockTransport, Method};
    use serde_json::json;
    use std::time::Duration;

    fn customer() -> UserProfile {
        serde_json::from_value(json!({"id": "7", "role": "CUSTOMER"})).unwrap()
    }

    fn messages_json(ids: &[i64]) -> serde_json::Value {
        json!(ids
            .iter()
            .map(|id| json!({"id": id, "senderId": "cs", "receiverId": "7", "message": format!("m{id}")}))
            .collect::<Vec<_>>())
    }

    fn poller() -> (ChatPoller, Arc<MockTransport>) {
        let (api, mock) = client();
        mock.ok(
            Method::Get,
            &path("/chat/first-customer-support"),
            json!({"id": "cs", "role": "CUSTOMER_SUPPORT"}),
        )
        .ok(Method::Put, &path("/chat/read/cs"), json!(null));
        (ChatPoller::new(api, ChatConfig::default()), mock)
    }

    #[tokio::test]
    async fn test_open_refuses_staff() {
        let (poller, _mock) = poller();
        let staff: UserProfile =
            serde_json::from_value(json!({"id": "2", "role": Role::Staff.as_str()})).unwrap();
        assert!(poller.open(Some(&staff)).is_err());
        assert_eq!(poller.view(), ChatView::Closed);
        assert!(poller.open(None).is_err());
    }

    #[tokio::test]
    async fn test_start_chat_assigns_agent_and_marks_read_once() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1, 2]));
        poller.open(Some(&customer())).unwrap();

        let partner = poller.start_chat().await.unwrap();
        assert_eq!(partner.as_str(), "cs");
        assert_eq!(poller.view(), ChatView::Chat);
        assert_eq!(poller.messages().len(), 2);

        poller.refresh_messages().await.unwrap();
        poller.back_to_menu().unwrap();
        poller.start_chat().await.unwrap();
        assert_eq!(mock.count(Method::Put, &path("/chat/read/cs")), 1);
        assert_eq!(mock.count(Method::Get, &path("/chat/first-customer-support")), 1);
    }

    #[tokio::test]
    async fn test_select_partner_from_menu() {
        let (poller, mock) = poller();
        mock.ok(Method::Put, &path("/chat/read/21"), json!(null))
            .ok(Method::Get, &path("/chat/conversation/21"), messages_json(&[4]));
        poller.open(Some(&customer())).unwrap();

        poller.select_partner(UserId::new("21")).await.unwrap();
        assert_eq!(poller.view(), ChatView::Chat);
        assert_eq!(poller.partner(), Some(UserId::new("21")));
        assert_eq!(poller.messages().len(), 1);
        assert_eq!(mock.count(Method::Get, &path("/chat/first-customer-support")), 0);
    }

    #[tokio::test]
    async fn test_refresh_emits_only_new_messages() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1, 2]));
        let mut events = poller.subscribe();
        poller.open(Some(&customer())).unwrap();
        poller.start_chat().await.unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::Messages { scroll: ScrollAction::ToBottom, .. }
        ));
        poller.refresh_messages().await.unwrap();
        assert!(events.try_recv().is_err());

        poller.refresh_messages().await.unwrap();
        let ChatEvent::Messages { messages, .. } = events.try_recv().unwrap() else {
            panic!("expected messages");
        };
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_reentering_chat_scrolls_to_bottom() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1, 2]));
        let mut events = poller.subscribe();
        poller.open(Some(&customer())).unwrap();
        poller.start_chat().await.unwrap();
        let _ = events.try_recv();

        poller.set_viewport(Viewport::new(100.0, 2000.0, 500.0));
        poller.back_to_menu().unwrap();
        poller.start_chat().await.unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            ChatEvent::Messages { scroll: ScrollAction::ToBottom, .. }
        ));
        assert_eq!(poller.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_poll_after_send_reports_scroll() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .ok(
                Method::Post,
                &path("/chat/send"),
                json!({"id": 2, "senderId": "7", "receiverId": "cs", "message": "hi"}),
            )
            .ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1, 2]));
        let mut events = poller.subscribe();
        poller.open(Some(&customer())).unwrap();
        poller.start_chat().await.unwrap();
        poller.set_viewport(Viewport::new(100.0, 2000.0, 500.0));
        let _ = events.try_recv();

        poller.send("hi").await.unwrap();
        // The echo is already in the list, so the poll brings nothing new.
        assert_eq!(
            poller.refresh_messages().await.unwrap(),
            Some(ScrollAction::ToBottom)
        );
        let ChatEvent::Messages { messages, scroll, .. } = events.try_recv().unwrap() else {
            panic!("expected messages");
        };
        assert_eq!(scroll, ScrollAction::ToBottom);
        assert_eq!(messages.len(), 2);

        assert_eq!(
            poller.refresh_messages().await.unwrap(),
            Some(ScrollAction::Restore(100.0))
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_hidden_or_menu_skips_requests() {
        let (poller, mock) = poller();
        poller.open(Some(&customer())).unwrap();
        assert_eq!(poller.refresh_messages().await.unwrap(), None);

        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]));
        poller.start_chat().await.unwrap();
        poller.set_visible(false);
        assert_eq!(poller.refresh_messages().await.unwrap(), None);
        assert_eq!(poller.refresh_unread().await.unwrap(), None);
        assert_eq!(mock.count(Method::Get, &path("/chat/conversation/cs")), 1);
        assert_eq!(mock.count(Method::Get, &path("/chat/unread-count")), 0);
    }

    #[tokio::test]
    async fn test_send_appends_echo() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .ok(
                Method::Post,
                &path("/chat/send"),
                json!({"id": 2, "senderId": "7", "receiverId": "cs", "message": "hello"}),
            );
        poller.open(Some(&customer())).unwrap();
        assert!(poller.send("hello").await.is_err());

        poller.start_chat().await.unwrap();
        assert!(poller.send("   ").await.is_err());
        let sent = poller.send(" hello ").await.unwrap();
        assert_eq!(sent.message, "hello");
        assert_eq!(poller.messages().len(), 2);
        assert_eq!(
            mock.requests_to(Method::Post, &path("/chat/send"))[0]
                .json_body()
                .unwrap()["message"],
            "hello"
        );
    }

    #[tokio::test]
    async fn test_unread_event_on_change() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/unread-count"), json!(3))
            .ok(Method::Get, &path("/chat/unread-count"), json!(3))
            .ok(Method::Get, &path("/chat/unread-count"), json!(120));
        let mut events = poller.subscribe();

        assert_eq!(poller.refresh_unread().await.unwrap(), Some(3));
        assert_eq!(events.try_recv().unwrap(), ChatEvent::Unread(3));
        poller.refresh_unread().await.unwrap();
        assert!(events.try_recv().is_err());
        poller.refresh_unread().await.unwrap();
        assert_eq!(poller.unread_badge().as_deref(), Some("99+"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_follow_intervals() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .ok(Method::Get, &path("/chat/unread-count"), json!(0));
        poller.open(Some(&customer())).unwrap();
        poller.start_chat().await.unwrap();

        let handle = poller.start();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(handle.is_running());
        // One load from start_chat, then ticks at 0, 3, 6 and 9 seconds.
        let polls = mock.count(Method::Get, &path("/chat/conversation/cs"));
        assert!((4..=5).contains(&polls), "{polls} polls");
        assert_eq!(mock.count(Method::Get, &path("/chat/unread-count")), 1);

        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(mock.count(Method::Get, &path("/chat/conversation/cs")), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_keep_polling() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .status(Method::Get, &path("/chat/conversation/cs"), 500)
            .ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1, 2]));
        poller.open(Some(&customer())).unwrap();
        poller.start_chat().await.unwrap();

        let handle = poller.start();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(handle.is_running());
        assert_eq!(poller.messages().len(), 2);
        assert_eq!(poller.view(), ChatView::Chat);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_tears_down() {
        let (poller, mock) = poller();
        mock.ok(Method::Get, &path("/chat/conversation/cs"), messages_json(&[1]))
            .status(Method::Get, &path("/chat/conversation/cs"), 401);
        let mut events = poller.subscribe();
        poller.open(Some(&customer())).unwrap();
        poller.start_chat().await.unwrap();
        let _ = events.try_recv();

        let handle = poller.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_running());
        assert_eq!(poller.view(), ChatView::Closed);
        assert_eq!(events.recv().await.unwrap(), ChatEvent::SessionExpired);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(mock.count(Method::Get, &path("/chat/conversation/cs")), 2);
        assert!(mock.count(Method::Get, &path("/chat/unread-count")) <= 1);
    }
}
