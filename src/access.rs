use std::collections::HashSet;

use parking_lot::RwLock;

use crate::error::Error;

/// Admin and ignore-list lookups. Implementations own their synchronization.
pub trait Access: Send + Sync {
    /// Case-sensitive membership test by nick.
    fn is_admin(&self, nick: &str) -> bool;
    fn is_ignored(&self, nick: &str) -> bool;
    fn ignore(&self, nick: &str) -> Result<(), Error>;
    fn recognize(&self, nick: &str) -> Result<(), Error>;
}

/// In-memory admin and ignore lists, seeded from the config.
#[derive(Debug, Default)]
pub struct AccessList {
    admins: HashSet<String>,
    ignored: RwLock<HashSet<String>>,
}

impl AccessList {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
            ignored: RwLock::default(),
        }
    }
}

impl Access for AccessList {
    fn is_admin(&self, nick: &str) -> bool {
        self.admins.contains(nick)
    }

    fn is_ignored(&self, nick: &str) -> bool {
        self.ignored.read().contains(nick)
    }

    fn ignore(&self, nick: &str) -> Result<(), Error> {
        if self.is_admin(nick) {
            return Err(Error::Access(format!("{nick} is an admin")));
        }
        if !self.ignored.write().insert(nick.to_string()) {
            return Err(Error::Access(format!("{nick} is already ignored")));
        }
        tracing::info!(nick = %nick, "ignoring user");
        Ok(())
    }

    fn recognize(&self, nick: &str) -> Result<(), Error> {
        if !self.ignored.write().remove(nick) {
            return Err(Error::Access(format!("{nick} is not ignored")));
        }
        tracing::info!(nick = %nick, "no longer ignoring user");
        Ok(())
    }
}
