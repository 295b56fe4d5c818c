use std::fmt;

use crate::event::CTCP_DELIM;

/// Middle parameters plus an optional free-text trailing parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pub middle: Vec<String>,
    pub trailing: Option<String>,
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for param in &self.middle {
            write!(f, " {param}")?;
        }
        match &self.trailing {
            Some(trailing) => write!(f, " :{trailing}"),
            None => Ok(()),
        }
    }
}

/// Joins a verb and its parameters into one wire line (without CRLF).
pub fn encode(verb: &str, middle: &[&str], trailing: Option<&str>) -> String {
    let params = Params {
        middle: middle.iter().map(|s| s.to_string()).collect(),
        trailing: trailing.map(str::to_string),
    };
    format!("{verb}{params}")
}

/// An outbound command, serialized with [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User { username: String, realname: String },
    Nick(String),
    /// NickServ `identify`, sent through the `NS` alias.
    Identify(String),
    Join(String),
    Part(String),
    Privmsg { target: String, text: String },
    Notice { target: String, text: String },
    Action { target: String, text: String },
    /// A CTCP reply, delivered as a framed NOTICE.
    CtcpReply { target: String, verb: String, text: String },
    Kick { channel: String, nick: String, reason: Option<String> },
    Invite { nick: String, channel: String },
    Mode { channel: String, mode: String, nick: String },
    Pong(String),
    Quit(String),
    /// Sent verbatim.
    Raw(String),
}

impl Command {
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Privmsg {
            target: target.into(),
            text: text.into(),
        }
    }

    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Notice {
            target: target.into(),
            text: text.into(),
        }
    }

    pub fn ctcp_reply(
        target: impl Into<String>,
        verb: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::CtcpReply {
            target: target.into(),
            verb: verb.into(),
            text: text.into(),
        }
    }

    pub fn ban(channel: &str, nick: &str) -> Self {
        Self::Mode {
            channel: channel.to_string(),
            mode: "+b".to_string(),
            nick: nick.to_string(),
        }
    }

    pub fn unban(channel: &str, nick: &str) -> Self {
        Self::Mode {
            channel: channel.to_string(),
            mode: "-b".to_string(),
            nick: nick.to_string(),
        }
    }

    pub const fn is_quit(&self) -> bool {
        matches!(self, Self::Quit(..))
    }

    /// The wire line with secrets masked, for logging.
    pub fn redacted(&self) -> String {
        match self {
            Self::Identify(..) => encode("NS", &["identify", "********"], None),
            cmd => cmd.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = match self {
            Self::User { username, realname } => {
                encode("USER", &[username.as_str(), "8", "*"], Some(realname.as_str()))
            }
            Self::Nick(nick) => encode("NICK", &[nick.as_str()], None),
            Self::Identify(password) => encode("NS", &["identify", password.as_str()], None),
            Self::Join(channel) => encode("JOIN", &[channel.as_str()], None),
            Self::Part(channel) => encode("PART", &[channel.as_str()], None),
            Self::Privmsg { target, text } => {
                encode("PRIVMSG", &[target.as_str()], Some(text.as_str()))
            }
            Self::Notice { target, text } => {
                encode("NOTICE", &[target.as_str()], Some(text.as_str()))
            }
            Self::Action { target, text } => {
                let body = format!("{CTCP_DELIM}ACTION {text}{CTCP_DELIM}");
                encode("PRIVMSG", &[target.as_str()], Some(body.as_str()))
            }
            Self::CtcpReply { target, verb, text } => {
                let body = match text.as_str() {
                    "" => format!("{CTCP_DELIM}{verb}{CTCP_DELIM}"),
                    text => format!("{CTCP_DELIM}{verb} {text}{CTCP_DELIM}"),
                };
                encode("NOTICE", &[target.as_str()], Some(body.as_str()))
            }
            Self::Kick {
                channel,
                nick,
                reason,
            } => encode(
                "KICK",
                &[channel.as_str(), nick.as_str()],
                reason.as_deref().filter(|r| !r.is_empty()),
            ),
            Self::Invite { nick, channel } => {
                encode("INVITE", &[nick.as_str(), channel.as_str()], None)
            }
            Self::Mode {
                channel,
                mode,
                nick,
            } => encode("MODE", &[channel.as_str(), mode.as_str(), nick.as_str()], None),
            Self::Pong(token) => encode("PONG", &[token.as_str()], None),
            Self::Quit(reason) => encode("QUIT", &[], Some(reason.as_str())),
            Self::Raw(line) => line.clone(),
        };
        f.write_str(&line)
    }
}
