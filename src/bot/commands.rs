use crate::command::Command;
use crate::context::Context;
use crate::event::is_channel;
use crate::users::User;
use crate::HELP;

/// Marks a chat message as a bot command.
pub const TRIGGER: char = ',';

const KICKBAN_REASON: &str = "beep boop i press buttons";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Help,
    Say,
    Yell,
    Slap,
    Gif,
    Nick,
    Join,
    Part,
    Invite,
    Kick,
    Ban,
    Unban,
    KickBan,
    Ignore,
    Recognize,
}

impl Verb {
    fn parse(verb: &str) -> Option<Self> {
        Some(match verb {
            "help" => Self::Help,
            "say" => Self::Say,
            "yell" => Self::Yell,
            "slap" => Self::Slap,
            "gif" => Self::Gif,
            "nick" => Self::Nick,
            "join" => Self::Join,
            "part" => Self::Part,
            "invite" => Self::Invite,
            "kick" | "k" => Self::Kick,
            "ban" | "b" => Self::Ban,
            "unban" | "ub" => Self::Unban,
            "kickban" | "kb" => Self::KickBan,
            "ignore" => Self::Ignore,
            "recognize" => Self::Recognize,
            _ => return None,
        })
    }

    const fn admin_only(self) -> bool {
        !matches!(self, Self::Help | Self::Say | Self::Yell | Self::Slap | Self::Gif)
    }

    const fn channel_only(self) -> bool {
        matches!(self, Self::Kick | Self::Ban | Self::Unban | Self::KickBan)
    }

    /// The argument part of the usage reply.
    const fn usage(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Say => "say text",
            Self::Yell => "yell text",
            Self::Slap => "slap user",
            Self::Gif => "gif query",
            Self::Nick => "nick nickname",
            Self::Join => "join #channel",
            Self::Part => "part #channel",
            Self::Invite => "invite user",
            Self::Kick => "kick user <message>",
            Self::Ban => "ban user",
            Self::Unban => "unban user",
            Self::KickBan => "kickban user",
            Self::Ignore => "ignore user",
            Self::Recognize => "recognize user",
        }
    }

    fn has_arguments(self, args: &[&str]) -> bool {
        let first = args.first().copied().unwrap_or_default();
        match self {
            Self::Help => true,
            Self::Say | Self::Yell | Self::Gif => !free_text(args).is_empty(),
            Self::Join | Self::Part => is_channel(first),
            _ => !first.is_empty(),
        }
    }
}

/// The arguments as one message, without surrounding blanks.
fn free_text(args: &[&str]) -> String {
    args.join(" ").trim().to_string()
}

/// Runs one command. `text` is the message with the trigger already
/// stripped; `reply_to` is where refusals and usage texts go.
pub fn interpret(ctx: &mut Context<'_>, reply_to: &str, text: &str, user: Option<&User>) {
    let mut split = text.split(' ');
    let Some(verb) = split.next().and_then(Verb::parse) else {
        return;
    };
    let args: Vec<&str> = split.collect();
    let nick = user.map_or("", |u| u.nick.as_str());

    if verb.admin_only() && !ctx.is_admin(user) {
        tracing::info!(nick = %nick, ?verb, "refused privileged command");
        ctx.privmsg(reply_to, format!("Sorry {nick}, I can't let you do that."));
        return;
    }
    if verb.channel_only() && !is_channel(reply_to) {
        ctx.privmsg(reply_to, format!("{nick}, this command must be sent on a channel."));
        return;
    }
    if !verb.has_arguments(&args) {
        ctx.privmsg(reply_to, format!("{nick}, usage: {TRIGGER}{}", verb.usage()));
        return;
    }

    tracing::debug!(nick = %nick, ?verb, "running command");
    let target = args.first().copied().unwrap_or_default();
    match verb {
        Verb::Help => ctx.privmsg(reply_to, format!("{nick}, {HELP}")),
        Verb::Say => ctx.privmsg(reply_to, free_text(&args)),
        Verb::Yell => ctx.privmsg(reply_to, free_text(&args).to_uppercase()),
        Verb::Slap => ctx.send(Command::Action {
            target: reply_to.to_string(),
            text: format!("slaps {target} around a bit with a large trout"),
        }),
        Verb::Gif => search_gif(ctx, reply_to, free_text(&args)),
        Verb::Nick => ctx.send(Command::Nick(target.to_string())),
        Verb::Join => ctx.send(Command::Join(target.to_string())),
        Verb::Part => ctx.send(Command::Part(target.to_string())),
        Verb::Invite => ctx.send(Command::Invite {
            nick: target.to_string(),
            channel: reply_to.to_string(),
        }),
        Verb::Kick => {
            let reason = args[1..].join(" ");
            ctx.send(Command::Kick {
                channel: reply_to.to_string(),
                nick: target.to_string(),
                reason: Some(reason).filter(|r| !r.is_empty()),
            })
        }
        Verb::Ban => ctx.send(Command::ban(reply_to, target)),
        Verb::Unban => ctx.send(Command::unban(reply_to, target)),
        Verb::KickBan => {
            ctx.send(Command::ban(reply_to, target));
            ctx.send(Command::Kick {
                channel: reply_to.to_string(),
                nick: target.to_string(),
                reason: Some(KICKBAN_REASON.to_string()),
            });
        }
        Verb::Ignore => match ctx.access.ignore(target) {
            Ok(()) => ctx.privmsg(reply_to, format!("{target} is now ignored.")),
            Err(err) => {
                tracing::debug!("{err}");
                ctx.privmsg(reply_to, format!("Sorry {nick}, I can't ignore {target}."));
            }
        },
        Verb::Recognize => match ctx.access.recognize(target) {
            Ok(()) => ctx.privmsg(reply_to, format!("{target} is no longer ignored.")),
            Err(err) => {
                tracing::debug!("{err}");
                ctx.privmsg(reply_to, format!("{nick}, {target} is not ignored."));
            }
        },
    }
}

fn search_gif(ctx: &mut Context<'_>, reply_to: &str, query: String) {
    let Some(gifs) = ctx.services.gifs.clone() else {
        tracing::debug!("gif search is not configured");
        return;
    };
    let outbox = ctx.outbox();
    let reply_to = reply_to.to_string();
    ctx.spawn(async move {
        match gifs.search_gif(&query).await {
            Ok(reply) => outbox.privmsg(&reply_to, reply),
            Err(err) => tracing::warn!(query = %query, "{err}"),
        }
    });
}
