use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The `nick!user@host` origin of a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl User {
    /// Splits a prefix token, with or without its leading `:`.
    pub fn parse(prefix: &str) -> Result<Self, Error> {
        let raw = prefix.strip_prefix(':').unwrap_or(prefix);

        let (Some(bang), Some(at)) = (raw.find('!'), raw.find('@')) else {
            return Err(Error::MalformedPrefix(prefix.to_string()));
        };
        if at < bang {
            return Err(Error::MalformedPrefix(prefix.to_string()));
        }

        Ok(Self {
            nick: raw[..bang].to_string(),
            user: raw[bang + 1..at].to_string(),
            host: raw[at + 1..].to_string(),
        })
    }
}

impl FromStr for User {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}
