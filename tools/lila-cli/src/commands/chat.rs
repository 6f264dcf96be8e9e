//! Following the support chat from the terminal.

use std::collections::HashSet;

use anyhow::{Context as _, Result};
use console::style;
use lila_client::{ApiClient, ChatEvent, ChatPoller, DeskEvent, SupportDesk};
use lila_commerce::chat::{ChatMessage, Conversation};
use lila_commerce::{MessageId, UserId};
use tokio::sync::broadcast::error::RecvError;

use super::{ChatArgs, ChatCommand};
use crate::context::Context;

/// Run the chat command.
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ChatCommand::Tail { partner } => tail(partner, ctx).await,
        ChatCommand::Send { text, partner } => send(&text, partner, ctx).await,
        ChatCommand::Unread => unread(ctx).await,
        ChatCommand::Desk => desk(ctx).await,
    }
}

/// Open the widget and enter a conversation, as the storefront does when
/// the customer clicks "chat with us".
async fn open_chat(
    api: &ApiClient,
    partner: Option<String>,
    ctx: &Context,
) -> Result<(ChatPoller, UserId, UserId)> {
    let me = api.auth().my_info().await.context("Failed to load profile")?;
    let poller = ChatPoller::new(api.clone(), ctx.config.chat.clone());
    poller
        .open(Some(&me))
        .context("This account cannot use the customer chat")?;

    let partner = match partner {
        Some(id) => {
            let id = UserId::new(id);
            poller.select_partner(id.clone()).await?;
            id
        }
        None => poller
            .start_chat()
            .await
            .context("No support agent is available")?,
    };
    Ok((poller, me.id, partner))
}

async fn tail(partner: Option<String>, ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let (poller, me, partner) = open_chat(&api, partner, ctx).await?;
    let mut events = poller.subscribe();

    ctx.output.header(&format!("Chat with {}", partner));
    let mut seen = HashSet::new();
    for message in fresh_messages(&mut seen, &poller.messages()) {
        print_message(message, &me, ctx);
    }

    let handle = poller.start();
    ctx.output.debug("Polling started; press Ctrl-C to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ChatEvent::Messages { messages, .. }) => {
                    for message in fresh_messages(&mut seen, &messages) {
                        print_message(message, &me, ctx);
                    }
                }
                Ok(ChatEvent::Unread(count)) => {
                    ctx.output.debug(&format!("{} unread message(s)", count));
                }
                Ok(ChatEvent::SessionExpired) => {
                    handle.stop().await;
                    anyhow::bail!("Session expired. Run `lila login` again.");
                }
                Err(RecvError::Lagged(skipped)) => {
                    ctx.output.debug(&format!("Skipped {} chat event(s)", skipped));
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    poller.close();
    Ok(())
}

async fn send(text: &str, partner: Option<String>, ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let (poller, _me, partner) = open_chat(&api, partner, ctx).await?;
    let sent = poller.send(text).await.context("Message was not sent")?;
    poller.close();

    if ctx.output.is_json() {
        ctx.output.json(&sent);
    } else {
        ctx.output.success(&format!("Sent to {}", partner));
    }
    Ok(())
}

async fn unread(ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let count = api
        .chat()
        .unread_count()
        .await
        .context("Failed to fetch the unread count")?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "unread": count }));
    } else {
        ctx.output.kv("Unread", &count.to_string());
    }
    Ok(())
}

async fn desk(ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let desk = SupportDesk::new(api, ctx.config.chat.clone());
    let mut events = desk.subscribe();

    desk.refresh_conversations()
        .await
        .context("Failed to load conversations")?;
    print_conversations(&desk.conversations(), ctx);

    let handle = desk.start();
    let mut last_unread = desk.total_unread();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(DeskEvent::Conversations(conversations)) => {
                    let unread: u32 = conversations.iter().map(|c| c.unread_count).sum();
                    if unread != last_unread {
                        last_unread = unread;
                        print_conversations(&conversations, ctx);
                    }
                }
                Ok(DeskEvent::Messages { .. }) => {}
                Ok(DeskEvent::SessionExpired) => {
                    handle.stop().await;
                    anyhow::bail!("Session expired. Run `lila login` again.");
                }
                Err(RecvError::Lagged(skipped)) => {
                    ctx.output.debug(&format!("Skipped {} desk event(s)", skipped));
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}

/// Messages from `messages` not printed yet, in order.
fn fresh_messages<'a>(
    seen: &mut HashSet<MessageId>,
    messages: &'a [ChatMessage],
) -> Vec<&'a ChatMessage> {
    messages
        .iter()
        .filter(|m| seen.insert(m.id.clone()))
        .collect()
}

fn print_message(message: &ChatMessage, me: &UserId, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json_line(message);
        return;
    }
    println!("{}", format_message(message, me));
}

fn format_message(message: &ChatMessage, me: &UserId) -> String {
    let time = message
        .created_at
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let who = if message.is_system() {
        style("shop".to_string()).magenta()
    } else if message.is_from(me) {
        style("you".to_string()).green()
    } else {
        style(message.sender_id.to_string()).cyan()
    };
    format!("{} {}: {}", style(time).dim(), who, message.message)
}

fn print_conversations(conversations: &[Conversation], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json_line(&conversations);
        return;
    }

    ctx.output.header("Conversations");
    if conversations.is_empty() {
        ctx.output.info("No conversations yet");
        return;
    }
    for conversation in conversations {
        let badge = conversation
            .badge()
            .map(|b| format!(" [{}]", b))
            .unwrap_or_default();
        ctx.output.list_item(&format!(
            "{}{}: {}",
            conversation.display_name(),
            badge,
            conversation.last_message.as_deref().unwrap_or("")
        ));
    }
}
