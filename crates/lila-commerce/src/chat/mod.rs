//! Customer-support chat: messages, the customer widget, the staff inbox
//! and the scroll rules both share.

mod inbox;
mod message;
mod scroll;
mod thread;
mod widget;

pub use inbox::SupportInbox;
pub use message::{
    relative_time, unread_badge, ChatMessage, Conversation, SystemNotice, SYSTEM_SENDER,
};
pub use scroll::{is_near_bottom, ScrollAction, ScrollPolicy, Viewport, NEAR_BOTTOM_PX};
pub use thread::{has_new_messages, MessageThread};
pub use widget::{widget_visible_for, ChatView, ChatWidget};
