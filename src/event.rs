use crate::error::Error;
use crate::users::User;

/// Delimiter framing a CTCP payload inside PRIVMSG text.
pub const CTCP_DELIM: char = '\x01';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Server keep-alive, answered by the dispatch loop itself.
    Ping,
    /// Three digit numeric reply, kept as an opaque string.
    Numeric,
    /// Any textual verb (PRIVMSG, NOTICE, JOIN, KICK, INVITE, ...).
    Command,
    /// A PRIVMSG whose text was CTCP framed; `code` is the CTCP verb.
    Ctcp,
}

/// One decoded inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub raw: String,
    pub kind: Kind,
    pub code: String,
    pub source: String,
    pub user: Option<User>,
    pub arguments: Vec<String>,
    pub message: String,
}

impl Event {
    /// Decodes a single wire line. Trailing CR/LF are ignored.
    pub fn decode(line: &str) -> Result<Self, Error> {
        let raw = line.trim_end_matches(['\r', '\n']);
        if raw.is_empty() {
            return Err(Error::Parse(raw.to_string()));
        }

        let (source, code, arguments) = match raw.strip_prefix(':') {
            Some(rest) => {
                let mut split = rest.split(' ');
                let source = split.next().unwrap_or_default();
                let code = split.next().unwrap_or_default();
                if source.is_empty() || code.is_empty() {
                    return Err(Error::Parse(raw.to_string()));
                }
                (source, code, split.map(str::to_string).collect::<Vec<_>>())
            }
            None => {
                let mut split = raw.split(' ');
                let code = split.next().unwrap_or_default();
                if code.is_empty() {
                    return Err(Error::Parse(raw.to_string()));
                }
                ("", code, split.map(str::to_string).collect())
            }
        };

        let mut event = Self {
            raw: raw.to_string(),
            kind: Self::classify(code),
            code: code.to_string(),
            source: source.to_string(),
            user: User::parse(source).ok(),
            arguments,
            message: String::new(),
        };

        if event.code == "PRIVMSG" {
            if event.arguments.len() < 2 {
                return Err(Error::Parse(event.raw));
            }
            let text = event.arguments[1..].join(" ");
            event.message = text.strip_prefix(':').unwrap_or(&text).to_string();

            if let Some(inner) = ctcp_body(&event.message) {
                let mut split = inner.split(' ');
                let verb = split.next().unwrap_or_default();
                if verb.is_empty() {
                    return Err(Error::Parse(event.raw));
                }
                event.kind = Kind::Ctcp;
                event.code = verb.to_string();
                event.arguments = split.map(str::to_string).collect();
            }
        }

        Ok(event)
    }

    fn classify(code: &str) -> Kind {
        match code {
            "PING" => Kind::Ping,
            c if c.len() == 3 && c.bytes().all(|b| b.is_ascii_digit()) => Kind::Numeric,
            _ => Kind::Command,
        }
    }

    /// The nick of the sender, or the raw source for server lines.
    pub fn sender(&self) -> &str {
        self.user.as_ref().map_or(&self.source, |u| &u.nick)
    }

    /// Where a reply to this PRIVMSG belongs: the channel it was sent on, or
    /// the sender for private messages.
    pub fn reply_to(&self) -> Option<&str> {
        let target = self.arguments.first()?;
        if is_channel(target) {
            Some(target)
        } else {
            self.user.as_ref().map(|u| u.nick.as_str())
        }
    }

    /// The keep-alive token: everything after the verb, verbatim (a leading
    /// `:` is kept and embedded spaces survive).
    pub fn ping_token(&self) -> Option<String> {
        if self.kind != Kind::Ping {
            return None;
        }
        let token = self.arguments.join(" ");
        (!token.is_empty()).then_some(token)
    }
}

impl TryFrom<&str> for Event {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::decode(value)
    }
}

pub fn is_channel(target: &str) -> bool {
    target.starts_with('#')
}

fn ctcp_body(message: &str) -> Option<&str> {
    message
        .strip_prefix(CTCP_DELIM)?
        .strip_suffix(CTCP_DELIM)
}
