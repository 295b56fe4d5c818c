//! The bot's own behavior, registered ahead of any embedder handlers.

mod commands;
mod ctcp;

use std::sync::Arc;

use crate::command::Command;
use crate::context::Context;
use crate::event::Event;
use crate::event_handler::Handlers;
use crate::services::TitleFetcher;

pub use commands::interpret;
pub use commands::TRIGGER;

pub fn register(handlers: &mut Handlers) {
    handlers
        .on("KICK", on_kick)
        .on("404", on_cannot_send)
        .on("474", on_cannot_join)
        .on("INVITE", on_invite)
        .on("PRIVMSG", on_privmsg);
    ctcp::register(handlers);
}

fn on_kick(ctx: &mut Context<'_>, event: &Event) {
    let [channel, nick, ..] = event.arguments.as_slice() else {
        return;
    };
    if *nick == ctx.config.nickname {
        tracing::warn!(channel = %channel, by = %event.sender(), "kicked from channel");
    }
}

// Numeric replies carry our own nick first, then the channel.
fn on_cannot_send(_: &mut Context<'_>, event: &Event) {
    if let Some(channel) = event.arguments.get(1) {
        tracing::warn!(channel = %channel, "can't send to channel");
    }
}

fn on_cannot_join(_: &mut Context<'_>, event: &Event) {
    if let Some(channel) = event.arguments.get(1) {
        tracing::warn!(channel = %channel, "can't join channel");
    }
}

fn on_invite(ctx: &mut Context<'_>, event: &Event) {
    let Some(channel) = event.arguments.get(1) else {
        return;
    };
    let channel = channel.strip_prefix(':').unwrap_or(channel);
    if channel.is_empty() {
        return;
    }

    tracing::info!(channel = %channel, by = %event.sender(), "invited");
    ctx.send(Command::Join(channel.to_string()));
    ctx.privmsg(
        channel,
        format!("Hi {channel}, {} invited me here.", event.sender()),
    );
}

fn on_privmsg(ctx: &mut Context<'_>, event: &Event) {
    let (Some(user), Some(reply_to)) = (event.user.as_ref(), event.reply_to()) else {
        return;
    };

    if let Some(text) = event.message.strip_prefix(TRIGGER) {
        interpret(ctx, reply_to, text, Some(user));
        return;
    }

    if let Some(reply) = ctx.services.replies.reply(&event.message, &user.nick) {
        ctx.privmsg(reply_to, reply);
    }

    let Some(titles) = ctx.services.titles.clone() else {
        return;
    };
    let urls: Vec<String> = ctx
        .services
        .replies
        .urls(&event.message)
        .map(str::to_string)
        .collect();
    for url in urls {
        fetch_title(ctx, Arc::clone(&titles), reply_to, url);
    }
}

fn fetch_title(ctx: &mut Context<'_>, titles: Arc<dyn TitleFetcher>, reply_to: &str, url: String) {
    let outbox = ctx.outbox();
    let reply_to = reply_to.to_string();
    ctx.spawn(async move {
        match titles.fetch_title(&url).await {
            Ok(title) => outbox.privmsg(&reply_to, format!("[URL] {title}")),
            Err(err) => tracing::warn!(url = %url, "{err}"),
        }
    });
}
