use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server could not be reached (refused, unresolvable or timed out).
    #[error("could not connect to {address}: {source}")]
    Dial {
        address: String,
        #[source]
        source: io::Error,
    },

    /// An inbound line had no usable prefix/command structure.
    #[error("could not parse line {0:?}")]
    Parse(String),

    #[error("malformed prefix {0:?}, expected nick!user@host")]
    MalformedPrefix(String),

    #[error("could not fetch title: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("gif search failed: {0}")]
    Search(#[source] reqwest::Error),

    /// The socket read loop ended without a quit being requested.
    #[error("connection lost: {0}")]
    Loop(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Config builder is missing a server address! Set it using `builder.server(...)`")]
    ServerAddressMissing,

    #[error("could not read config file: {0}")]
    ConfigRead(#[from] io::Error),

    #[error("could not decode config file: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("{0}")]
    Access(String),
}
