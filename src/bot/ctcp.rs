use chrono::Utc;

use crate::command::Command;
use crate::context::Context;
use crate::event::Event;
use crate::event_handler::Handlers;
use crate::VERSION;

const NOT_AN_ADMIN: &str = "NOTOK NOT_AN_ADMIN";

pub(super) fn register(handlers: &mut Handlers) {
    handlers
        .on_ctcp("VERSION", version)
        .on_ctcp("TIME", time)
        .on_ctcp("PING", ping)
        .on_ctcp("RAW", raw)
        .on_ctcp("QUIT", quit);
}

fn version(ctx: &mut Context<'_>, event: &Event) {
    if let Some(user) = &event.user {
        ctx.send(Command::ctcp_reply(&user.nick, "VERSION", VERSION));
    }
}

fn time(ctx: &mut Context<'_>, event: &Event) {
    if let Some(user) = &event.user {
        let now = Utc::now().format("%A, %d-%b-%y %H:%M:%S UTC");
        ctx.send(Command::ctcp_reply(&user.nick, "TIME", now.to_string()));
    }
}

fn ping(ctx: &mut Context<'_>, event: &Event) {
    if let Some(user) = &event.user {
        ctx.send(Command::ctcp_reply(&user.nick, "PING", event.arguments.join(" ")));
    }
}

fn raw(ctx: &mut Context<'_>, event: &Event) {
    let Some(user) = &event.user else {
        return;
    };
    if !ctx.is_admin(Some(user)) {
        ctx.send(Command::ctcp_reply(&user.nick, "RAW", NOT_AN_ADMIN));
        return;
    }

    ctx.send(Command::ctcp_reply(&user.nick, "RAW", "OK"));
    let line = event.arguments.join(" ");
    if !line.is_empty() {
        tracing::info!(nick = %user.nick, "sending raw line");
        ctx.send(Command::Raw(line));
    }
}

fn quit(ctx: &mut Context<'_>, event: &Event) {
    let Some(user) = &event.user else {
        return;
    };
    if !ctx.is_admin(Some(user)) {
        ctx.send(Command::ctcp_reply(&user.nick, "QUIT", NOT_AN_ADMIN));
        return;
    }

    tracing::info!(nick = %user.nick, "quit requested");
    ctx.send(Command::ctcp_reply(&user.nick, "QUIT", "OK"));
    ctx.quit();
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::testing::Harness;
    use crate::VERSION;

    fn harness() -> Harness {
        let config = Config::builder("commabot")
            .server("irc.example.org", 6667)
            .admin("alice")
            .build()
            .unwrap();
        Harness::new(config)
    }

    #[test]
    fn version_and_ping_reply_by_notice() {
        let mut h = harness();
        h.dispatch(":bob!b@h PRIVMSG commabot :\x01VERSION\x01");
        h.dispatch(":bob!b@h PRIVMSG #rust :\x01PING 1700000000 42\x01");
        assert_eq!(
            h.sent(),
            vec![
                format!("NOTICE bob :\x01VERSION {VERSION}\x01"),
                "NOTICE bob :\x01PING 1700000000 42\x01".to_string(),
            ]
        );
    }

    #[test]
    fn time_reply_is_framed() {
        let mut h = harness();
        h.dispatch(":bob!b@h PRIVMSG commabot :\x01TIME\x01");
        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        let shape = regex::Regex::new(
            r"^NOTICE bob :\x01TIME [A-Z][a-z]+day, \d{2}-[A-Z][a-z]{2}-\d{2} \d{2}:\d{2}:\d{2} UTC\x01$",
        )
        .unwrap();
        assert!(shape.is_match(&sent[0]), "{:?}", sent[0]);
    }

    #[test]
    fn raw_needs_an_admin() {
        let mut h = harness();
        h.dispatch(":bob!b@h PRIVMSG commabot :\x01RAW JOIN #evil\x01");
        assert_eq!(h.sent(), vec!["NOTICE bob :\x01RAW NOTOK NOT_AN_ADMIN\x01"]);

        h.dispatch(":alice!a@h PRIVMSG commabot :\x01RAW JOIN #ops\x01");
        assert_eq!(
            h.sent(),
            vec!["NOTICE alice :\x01RAW OK\x01", "JOIN #ops"]
        );
    }

    #[test]
    fn quit_needs_an_admin() {
        let mut h = harness();
        h.dispatch(":bob!b@h PRIVMSG commabot :\x01QUIT\x01");
        assert_eq!(h.sent(), vec!["NOTICE bob :\x01QUIT NOTOK NOT_AN_ADMIN\x01"]);
        assert!(!h.quit_requested());

        h.dispatch(":alice!a@h PRIVMSG commabot :\x01QUIT\x01");
        assert_eq!(h.sent(), vec!["NOTICE alice :\x01QUIT OK\x01"]);
        assert!(h.quit_requested());
    }

    #[test]
    fn server_ping_is_not_a_ctcp_ping() {
        let mut h = harness();
        h.dispatch("PING :irc.example.org");
        assert_eq!(h.sent(), vec!["PONG :irc.example.org"]);
    }
}
