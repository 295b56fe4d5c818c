//! An IRC bot engine: a line codec, a registration handshake, an ordered
//! dispatch loop and the chat commands built on top of it.

pub mod access;
pub mod bot;
pub mod client;
pub mod command;
pub mod config;
pub mod connection;
pub mod context;
mod dispatch;
pub mod error;
pub mod event;
pub mod event_handler;
pub mod services;
mod tasks;
pub mod users;

#[cfg(test)]
mod testing;

pub use access::Access;
pub use access::AccessList;
pub use client::Client;
pub use client::ClientBuilder;
pub use client::QuitHandle;
pub use command::Command;
pub use config::Config;
pub use context::Context;
pub use context::Session;
pub use context::Status;
pub use error::Error;
pub use error::Result;
pub use event::Event;
pub use event::Kind;
pub use event_handler::EventHandler;
pub use event_handler::Handlers;
pub use services::Services;
pub use users::User;

/// Sent as the CTCP VERSION reply and the HTTP User-Agent.
pub const VERSION: &str = concat!("ircbot v", env!("CARGO_PKG_VERSION"));

pub const HELP: &str = concat!(
    "ircbot v",
    env!("CARGO_PKG_VERSION"),
    ", commands: ,say ,yell ,slap ,gif ,help; admins also get ,nick ,join ,part ,invite ,kick ,ban ,unban ,kickban ,ignore ,recognize"
);
