//! The customer-support desk: every conversation, plus the one being
//! answered.

use super::{lock, spawn_loops, ticker, Lifecycle, PollerHandle, EVENT_CAPACITY};
use crate::api::ApiClient;
use crate::config::ChatConfig;
use crate::error::ClientError;
use crate::inflight::InFlight;
use lila_commerce::chat::{
    has_new_messages, ChatMessage, Conversation, ScrollAction, ScrollPolicy, SupportInbox,
    Viewport,
};
use lila_commerce::UserId;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DeskEvent {
    /// A fresh conversation list.
    Conversations(Vec<Conversation>),
    /// The selected conversation has new messages, or an armed scroll to
    /// the bottom was applied.
    Messages {
        partner: UserId,
        messages: Vec<ChatMessage>,
        scroll: ScrollAction,
    },
    /// A request came back 401: the desk emptied and polling stopped.
    SessionExpired,
}

#[derive(Debug)]
struct Shared {
    api: ApiClient,
    config: ChatConfig,
    inbox: Mutex<SupportInbox>,
    viewport: Mutex<Option<Viewport>>,
    read_marked: Mutex<Option<UserId>>,
    list_busy: AtomicBool,
    thread_busy: AtomicBool,
    lifecycle: Arc<Lifecycle>,
    events: broadcast::Sender<DeskEvent>,
}

/// Drives a [`SupportInbox`] for support staff.
#[derive(Debug, Clone)]
pub struct SupportDesk {
    shared: Arc<Shared>,
}

impl SupportDesk {
    pub fn new(api: ApiClient, config: ChatConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inbox = SupportInbox::new(ScrollPolicy::with_threshold(config.near_bottom_px));
        Self {
            shared: Arc::new(Shared {
                api,
                config,
                inbox: Mutex::new(inbox),
                viewport: Mutex::new(None),
                read_marked: Mutex::new(None),
                list_busy: AtomicBool::new(false),
                thread_busy: AtomicBool::new(false),
                lifecycle: Arc::new(Lifecycle::new()),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
        self.shared.events.subscribe()
    }

    /// Start the conversation-list and open-thread loops.
    pub fn start(&self) -> PollerHandle {
        let config = &self.shared.config;
        let list = self.clone();
        let thread = self.clone();
        spawn_loops(
            &self.shared.lifecycle,
            vec![
                (
                    "desk-conversations",
                    config.conversation_interval(),
                    ticker(move || {
                        let desk = list.clone();
                        async move { desk.refresh_conversations().await.map(drop) }
                    }),
                ),
                (
                    "desk-thread",
                    config.message_interval(),
                    ticker(move || {
                        let desk = thread.clone();
                        async move { desk.refresh_thread().await.map(drop) }
                    }),
                ),
            ],
        )
    }

    pub fn set_visible(&self, visible: bool) {
        self.shared.lifecycle.set_visible(visible);
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        lock(&self.shared.inbox).conversations().to_vec()
    }

    pub fn selected(&self) -> Option<Conversation> {
        lock(&self.shared.inbox).selected().cloned()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.shared.inbox).messages().to_vec()
    }

    pub fn total_unread(&self) -> u32 {
        lock(&self.shared.inbox).total_unread()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        lock(&self.shared.inbox).on_user_scroll(&viewport);
        *lock(&self.shared.viewport) = Some(viewport);
    }

    fn forget_viewport(&self) {
        *lock(&self.shared.viewport) = None;
    }

    /// One conversation-list poll. Returns the number of conversations, or
    /// `None` when the tick was skipped.
    pub async fn refresh_conversations(&self) -> Result<Option<usize>, ClientError> {
        let shared = &self.shared;
        if !shared.lifecycle.is_active() {
            return Ok(None);
        }
        let Some(_flight) = InFlight::try_start(&shared.list_busy) else {
            debug!("conversation poll still running, tick skipped");
            return Ok(None);
        };

        let conversations = self.session(shared.api.chat().conversations().await)?;
        if shared.lifecycle.is_stopped() {
            return Ok(None);
        }
        let count = conversations.len();
        lock(&shared.inbox).set_conversations(conversations.clone());
        self.emit(DeskEvent::Conversations(conversations));
        Ok(Some(count))
    }

    /// Open the conversation with `partner` from the current list. A newly
    /// selected conversation is marked read and loaded.
    pub async fn select(&self, partner: &UserId) -> Result<(), ClientError> {
        let changed = {
            let mut inbox = lock(&self.shared.inbox);
            if !inbox.conversations().iter().any(|c| &c.partner_id == partner) {
                return Err(ClientError::NotFound(format!("conversation with {partner}")));
            }
            inbox.select_partner(partner)
        };
        if !changed {
            return Ok(());
        }
        self.forget_viewport();
        if self.mark_read_once(partner).await? {
            self.refresh_conversations().await?;
        }
        self.refresh_thread().await?;
        Ok(())
    }

    /// Returns whether the backend was told.
    async fn mark_read_once(&self, partner: &UserId) -> Result<bool, ClientError> {
        if lock(&self.shared.read_marked).as_ref() == Some(partner) {
            return Ok(false);
        }
        match self.session(self.shared.api.chat().mark_read(partner).await) {
            Ok(()) => {
                *lock(&self.shared.read_marked) = Some(partner.clone());
                Ok(true)
            }
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                warn!(partner_id = %partner, error = %e, "could not mark conversation read");
                Ok(false)
            }
        }
    }

    pub fn deselect(&self) {
        lock(&self.shared.inbox).deselect();
        *lock(&self.shared.read_marked) = None;
        self.forget_viewport();
    }

    /// One poll of the selected conversation.
    pub async fn refresh_thread(&self) -> Result<Option<ScrollAction>, ClientError> {
        let shared = &self.shared;
        if !shared.lifecycle.is_active() {
            return Ok(None);
        }
        let Some(partner) = lock(&shared.inbox).selected_partner().cloned() else {
            return Ok(None);
        };
        let Some(_flight) = InFlight::try_start(&shared.thread_busy) else {
            debug!(partner_id = %partner, "thread poll still running, tick skipped");
            return Ok(None);
        };

        let messages = self.session(shared.api.chat().conversation(&partner).await)?;
        if shared.lifecycle.is_stopped() {
            return Ok(None);
        }

        let before = *lock(&shared.viewport);
        let (action, fresh) = {
            let mut inbox = lock(&shared.inbox);
            let fresh = has_new_messages(inbox.messages(), &messages);
            let action = inbox.on_messages(&partner, messages.clone(), before.as_ref());
            (action, fresh)
        };
        let notify = |scroll: &ScrollAction| fresh || *scroll == ScrollAction::ToBottom;
        if let Some(scroll) = action.filter(notify) {
            self.emit(DeskEvent::Messages {
                partner,
                messages,
                scroll,
            });
        }
        Ok(action)
    }

    /// Reply in the selected conversation, then refresh the list.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ClientError> {
        let partner = lock(&self.shared.inbox)
            .selected_partner()
            .cloned()
            .ok_or_else(|| ClientError::Validation("no conversation selected".to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::Validation("message is empty".to_string()));
        }

        let sent = self.session(self.shared.api.chat().send(&partner, text).await)?;
        lock(&self.shared.inbox).on_sent(sent.clone());
        match self.refresh_conversations().await {
            Ok(_) => {}
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => warn!(error = %e, "could not refresh conversations after sending"),
        }
        Ok(sent)
    }

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
        {
            let mut inbox = lock(&self.shared.inbox);
            inbox.clear_conversations();
            inbox.deselect();
        }
        *lock(&self.shared.read_marked) = None;
        self.forget_viewport();
        self.shared.lifecycle.stop();
        if first {
            warn!("support desk session expired, polling stopped");
            self.emit(DeskEvent::SessionExpired);
        }
    }

    fn emit(&self, event: DeskEvent) {
        let _ = self.shared.events.send(event);
    }
}
