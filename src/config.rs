use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

const fn default_port() -> u16 {
    6667
}

const fn default_timeout() -> u64 {
    5
}

const fn default_max_tasks() -> usize {
    32
}

const fn default_giphy_limit() -> u8 {
    10
}

/// Immutable bot configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub nickname: String,
    pub username: String,
    pub realname: String,
    #[serde(default)]
    pub admins: Vec<String>,
    pub server: ServerConfig,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub giphy: Option<GiphyConfig>,
    /// Extra whole-message replies, `trigger -> reply`.
    #[serde(default)]
    pub replies: BTreeMap<String, String>,
    /// URLs matching any of these patterns are never fetched.
    #[serde(default)]
    pub ignored_urls: Vec<String>,
    /// Upper bound on concurrently running handler tasks.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub nickserv_password: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GiphyConfig {
    pub api_key: String,
    #[serde(default = "default_giphy_limit")]
    pub limit: u8,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(data)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), Error> {
        if self.nickname.chars().count() < 3 {
            return Err(Error::Config("nickname is empty or too short".into()));
        }
        if self.username.is_empty() {
            return Err(Error::Config("username can't be empty".into()));
        }
        if self.realname.is_empty() {
            return Err(Error::Config("realname can't be empty".into()));
        }
        if self.server.address.is_empty() {
            return Err(Error::Config("server address not specified".into()));
        }
        if self.server.port == 0 {
            return Err(Error::Config("server port can't be zero".into()));
        }
        if self.max_tasks == 0 {
            return Err(Error::Config("max_tasks can't be zero".into()));
        }
        for pattern in &self.ignored_urls {
            if let Err(err) = regex::Regex::new(pattern) {
                return Err(Error::Config(format!("invalid ignored url {pattern:?}: {err}")));
            }
        }
        Ok(())
    }

    /// The NickServ password, if one is configured.
    pub fn nickserv_password(&self) -> Option<&str> {
        Some(self.server.nickserv_password.as_str()).filter(|p| !p.is_empty())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn builder(nickname: &str) -> ConfigBuilder {
        ConfigBuilder::new(nickname)
    }
}

pub struct ConfigBuilder {
    config: Config,
    server_address: Option<(String, u16)>,
}

impl ConfigBuilder {
    pub fn new(nickname: &str) -> Self {
        ConfigBuilder {
            config: Config {
                nickname: nickname.to_string(),
                username: nickname.to_string(),
                realname: nickname.to_string(),
                admins: Vec::new(),
                server: ServerConfig {
                    address: String::new(),
                    port: default_port(),
                    nickserv_password: String::new(),
                    channels: Vec::new(),
                    timeout_secs: default_timeout(),
                },
                debug: false,
                giphy: None,
                replies: BTreeMap::new(),
                ignored_urls: Vec::new(),
                max_tasks: default_max_tasks(),
            },
            server_address: None,
        }
    }

    pub fn build(mut self) -> Result<Config, Error> {
        let Some((address, port)) = self.server_address else {
            return Err(Error::ServerAddressMissing);
        };
        self.config.server.address = address;
        self.config.server.port = port;
        self.config.check()?;
        Ok(self.config)
    }

    pub fn server(mut self, address: &str, port: u16) -> Self {
        self.server_address = Some((address.to_string(), port));
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.config.username = username.to_string();
        self
    }

    pub fn realname(mut self, realname: &str) -> Self {
        self.config.realname = realname.to_string();
        self
    }

    pub fn admin(mut self, nick: &str) -> Self {
        self.config.admins.push(nick.to_string());
        self
    }

    pub fn channel(mut self, channel: &str) -> Self {
        self.config.server.channels.push(channel.to_string());
        self
    }

    pub fn nickserv_password(mut self, password: &str) -> Self {
        self.config.server.nickserv_password = password.to_string();
        self
    }

    pub fn reply(mut self, trigger: &str, reply: &str) -> Self {
        self.config
            .replies
            .insert(trigger.to_string(), reply.to_string());
        self
    }

    pub fn ignored_url(mut self, pattern: &str) -> Self {
        self.config.ignored_urls.push(pattern.to_string());
        self
    }

    pub fn max_tasks(mut self, max_tasks: usize) -> Self {
        self.config.max_tasks = max_tasks;
        self
    }
}
