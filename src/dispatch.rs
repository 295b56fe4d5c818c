use std::sync::Arc;

use crate::access::Access;
use crate::client::QuitHandle;
use crate::command::Command;
use crate::config::Config;
use crate::connection::Outbox;
use crate::context::Context;
use crate::context::Session;
use crate::event::Event;
use crate::event::Kind;
use crate::event_handler::Handlers;
use crate::services::Services;
use crate::tasks::Tasks;

/// The single consumer of inbound lines. Owns the session flags and the
/// handler task set.
pub(crate) struct Dispatcher {
    pub(crate) config: Arc<Config>,
    pub(crate) session: Session,
    pub(crate) access: Arc<dyn Access>,
    pub(crate) services: Services,
    pub(crate) handlers: Handlers,
    pub(crate) tasks: Tasks,
    pub(crate) quit: QuitHandle,
    pub(crate) outbox: Outbox,
}

impl Dispatcher {
    pub(crate) fn dispatch(&mut self, line: &str) {
        let event = match Event::decode(line) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("dropping line: {err}");
                return;
            }
        };

        for command in self.session.advance(&event, &self.config) {
            self.outbox.send(command);
        }

        if let Some(token) = event.ping_token() {
            self.outbox.send(Command::Pong(token));
        }

        if self.is_ignored(&event) {
            tracing::trace!(nick = %event.sender(), "ignored user");
            return;
        }

        let handlers = self.handlers.get(&event);
        if handlers.is_empty() {
            return;
        }

        let mut ctx = Context {
            config: &self.config,
            session: &self.session,
            access: self.access.as_ref(),
            services: &self.services,
            outbox: &self.outbox,
            tasks: &mut self.tasks,
            quit: &self.quit,
        };
        for handler in handlers {
            handler.on_event(&mut ctx, &event);
        }
    }

    fn is_ignored(&self, event: &Event) -> bool {
        let chat = event.kind == Kind::Ctcp || event.code == "PRIVMSG";
        chat && event
            .user
            .as_ref()
            .is_some_and(|user| self.access.is_ignored(&user.nick))
    }

    /// A handler context outside of any event.
    #[cfg(test)]
    pub(crate) fn context(&mut self) -> Context<'_> {
        Context {
            config: &self.config,
            session: &self.session,
            access: self.access.as_ref(),
            services: &self.services,
            outbox: &self.outbox,
            tasks: &mut self.tasks,
            quit: &self.quit,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::context::Status;
    use crate::testing::Harness;

    fn harness() -> Harness {
        let config = Config::builder("commabot")
            .server("irc.example.org", 6667)
            .nickserv_password("hunter2")
            .channel("#one")
            .channel("#two")
            .build()
            .unwrap();
        Harness::new(config)
    }

    #[test]
    fn ping_gets_pong() {
        let mut h = harness();
        h.dispatch("PING :irc.example.org");
        h.dispatch("PING 12345");
        assert_eq!(h.sent(), vec!["PONG :irc.example.org", "PONG 12345"]);
    }

    #[test]
    fn handshake_in_wire_order() {
        let mut h = harness();
        h.dispatch(":irc.example.org NOTICE * :*** Looking up your hostname...");
        h.dispatch(":irc.example.org NOTICE * :*** Found your hostname");
        h.dispatch(":irc.example.org 001 commabot :Welcome to the network");
        h.dispatch(":services. 900 commabot commabot!c@h commabot :You are now logged in");
        assert_eq!(
            h.sent(),
            vec![
                "USER commabot 8 * :commabot",
                "NICK commabot",
                "NS identify hunter2",
                "JOIN #one",
                "JOIN #two",
            ]
        );
        assert_eq!(h.session.status(), Status::Identified);
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let mut h = harness();
        h.dispatch("");
        h.dispatch(": PRIVMSG");
        h.dispatch(":bob!b@h PRIVMSG #rust");
        h.dispatch(":bob!b@h PRIVMSG #rust :\x01\x01");
        h.dispatch("PING :still alive");
        assert_eq!(h.sent(), vec!["PONG :still alive"]);
    }

    #[test]
    fn user_handlers_run_after_the_bots() {
        let mut h = harness();
        h.handlers.on("PRIVMSG", |ctx, event| {
            ctx.privmsg("#log", format!("saw {}", event.message));
        });
        h.dispatch(":bob!b@h PRIVMSG #rust :,say hi");
        assert_eq!(h.sent(), vec!["PRIVMSG #rust :hi", "PRIVMSG #log :saw ,say hi"]);
    }
}
