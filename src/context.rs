use std::future::Future;

use crate::access::Access;
use crate::client::QuitHandle;
use crate::command::Command;
use crate::config::Config;
use crate::connection::Outbox;
use crate::event::Event;
use crate::event::Kind;
use crate::services::Services;
use crate::tasks::Tasks;
use crate::users::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Fresh,
    Connected,
    Registered,
    Identified,
    Closed,
}

/// Per-connection handshake state. Only the dispatch loop writes to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub connected: bool,
    pub registered: bool,
    pub identified: bool,
    pub closed: bool,
}

impl Session {
    pub fn status(&self) -> Status {
        match *self {
            Self { closed: true, .. } => Status::Closed,
            Self {
                identified: true, ..
            } => Status::Identified,
            Self {
                registered: true, ..
            } => Status::Registered,
            Self {
                connected: true, ..
            } => Status::Connected,
            _ => Status::Fresh,
        }
    }

    pub fn connect(&mut self) {
        self.connected = true;
        tracing::debug!(status = ?self.status(), "socket opened");
    }

    pub fn close(&mut self) {
        self.closed = true;
        tracing::debug!(status = ?self.status(), "connection closed");
    }

    /// Applies the handshake transitions for one event and returns the
    /// commands they require, in send order.
    pub fn advance(&mut self, event: &Event, config: &Config) -> Vec<Command> {
        match (event.kind, event.code.as_str()) {
            (Kind::Command, "NOTICE")
                if !self.registered && event.arguments.first().is_some_and(|t| t == "*") =>
            {
                self.registered = true;
                tracing::debug!(status = ?self.status(), "registering");
                vec![
                    Command::User {
                        username: config.username.clone(),
                        realname: config.realname.clone(),
                    },
                    Command::Nick(config.nickname.clone()),
                ]
            }

            (Kind::Numeric, "001") => match config.nickserv_password() {
                Some(password) => vec![Command::Identify(password.to_string())],
                None => {
                    tracing::debug!("no nickserv password configured, not identifying");
                    vec![]
                }
            },

            (Kind::Numeric, "900") if !self.registered => {
                tracing::warn!("ignoring 900 before registration");
                vec![]
            }

            (Kind::Numeric, "900") if !self.identified => {
                self.identified = true;
                tracing::info!(status = ?self.status(), "identified, joining channels");
                config
                    .server
                    .channels
                    .iter()
                    .cloned()
                    .map(Command::Join)
                    .collect()
            }

            _ => vec![],
        }
    }
}

/// What a handler sees while reacting to one event.
pub struct Context<'a> {
    pub config: &'a Config,
    pub session: &'a Session,
    pub access: &'a dyn Access,
    pub services: &'a Services,
    pub(crate) outbox: &'a Outbox,
    pub(crate) tasks: &'a mut Tasks,
    pub(crate) quit: &'a QuitHandle,
}

impl Context<'_> {
    pub fn send(&self, command: Command) {
        self.outbox.send(command)
    }

    pub fn privmsg(&self, target: &str, text: impl Into<String>) {
        self.send(Command::privmsg(target, text))
    }

    pub fn is_admin(&self, user: Option<&User>) -> bool {
        user.is_some_and(|user| self.access.is_admin(&user.nick))
    }

    /// A handle to the outbound queue that can be moved into a task.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Runs slow work off the dispatch loop. Returns `false` if the task set
    /// is full and the work was dropped.
    pub fn spawn<F>(&mut self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task)
    }

    /// Requests a graceful quit. Only the first request has an effect.
    pub fn quit(&self) {
        self.quit.quit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::builder("commabot")
            .server("irc.example.org", 6667)
            .username("comma")
            .realname("Comma Bot")
            .channel("#one")
            .channel("#two")
            .channel("#three")
            .build()
            .unwrap()
    }

    fn event(line: &str) -> Event {
        Event::decode(line).unwrap()
    }

    #[test]
    fn status_follows_flags() {
        let mut session = Session::default();
        assert_eq!(session.status(), Status::Fresh);
        session.connect();
        assert_eq!(session.status(), Status::Connected);
        session.registered = true;
        assert_eq!(session.status(), Status::Registered);
        session.identified = true;
        assert_eq!(session.status(), Status::Identified);
        session.close();
        assert_eq!(session.status(), Status::Closed);
    }

    #[test]
    fn star_notice_registers_once() {
        let config = config();
        let mut session = Session::default();
        session.connect();

        let notice = event(":irc.example.org NOTICE * :*** Looking up your hostname");
        let out = session.advance(&notice, &config);
        assert_eq!(
            out.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["USER comma 8 * :Comma Bot", "NICK commabot"]
        );
        assert!(session.registered);

        assert!(session.advance(&notice, &config).is_empty());
    }

    #[test]
    fn notice_to_someone_else_does_not_register() {
        let config = config();
        let mut session = Session::default();
        let notice = event(":irc.example.org NOTICE commabot :hello");
        assert!(session.advance(&notice, &config).is_empty());
        assert!(!session.registered);
    }

    #[test]
    fn welcome_identifies_only_with_password() {
        let welcome = event(":irc.example.org 001 commabot :Welcome");
        let mut session = Session::default();
        assert!(session.advance(&welcome, &config()).is_empty());

        let config = Config::builder("commabot")
            .server("irc.example.org", 6667)
            .nickserv_password("hunter2")
            .build()
            .unwrap();
        assert_eq!(
            session.advance(&welcome, &config),
            vec![Command::Identify("hunter2".into())]
        );
    }

    #[test]
    fn identified_joins_channels_in_order() {
        let config = config();
        let mut session = Session {
            connected: true,
            registered: true,
            ..Session::default()
        };

        let identified = event(":services. 900 commabot commabot!c@h commabot :You are now logged in");
        assert_eq!(
            session.advance(&identified, &config),
            vec![
                Command::Join("#one".into()),
                Command::Join("#two".into()),
                Command::Join("#three".into()),
            ]
        );
        assert_eq!(session.status(), Status::Identified);

        assert!(session.advance(&identified, &config).is_empty());
    }

    #[test]
    fn identified_never_precedes_registered() {
        let mut session = Session::default();
        let identified = event(":services. 900 commabot :logged in");
        assert!(session.advance(&identified, &config()).is_empty());
        assert!(!session.identified);
    }
}
