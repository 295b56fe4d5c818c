use regex::Regex;
use reqwest::Url;

use crate::config::Config;
use crate::error::Error;

const SHRUG: &str = r"¯\_(ツ)_/¯";

/// Canned answers to whole messages, and the URL filter.
#[derive(Debug)]
pub struct Replies {
    fixed: Vec<(String, String)>,
    hello: Regex,
    salut: Regex,
    ignored_urls: Vec<Regex>,
}

impl Replies {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|err| Error::Config(format!("invalid pattern {pattern:?}: {err}")))
        };

        let mut fixed = vec![
            ("test".to_string(), "test".to_string()),
            ("shrug".to_string(), SHRUG.to_string()),
            (r"\o".to_string(), "o/".to_string()),
            ("o/".to_string(), r"\o".to_string()),
        ];
        fixed.extend(config.replies.clone());

        Ok(Self {
            fixed,
            hello: compile(r"^[Hh](i|ello)\s*[!.]?$")?,
            salut: compile(r"^[Ss]alut\s*[!.]?$")?,
            ignored_urls: config
                .ignored_urls
                .iter()
                .map(|p| compile(p.as_str()))
                .collect::<Result<_, _>>()?,
        })
    }

    /// The reply to a whole message, if it is a known trigger.
    pub fn reply(&self, message: &str, nick: &str) -> Option<String> {
        if message == "ping" {
            return Some(format!("pong {nick}"));
        }
        if let Some((_, reply)) = self.fixed.iter().find(|(trigger, _)| trigger == message) {
            return Some(reply.clone());
        }
        if self.hello.is_match(message) {
            return Some(format!("Hello, {nick}!"));
        }
        if self.salut.is_match(message) {
            return Some(format!("Salut, {nick}!"));
        }
        None
    }

    /// Tokens of `message` that look like fetchable URLs.
    pub fn urls<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        message
            .split_whitespace()
            .filter(|token| is_url(token))
            .filter(move |token| !self.ignored_urls.iter().any(|re| re.is_match(token)))
    }
}

pub fn is_url(token: &str) -> bool {
    token.len() >= "http://".len()
        && token.starts_with("http")
        && Url::parse(token).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replies() -> Replies {
        let config = Config::builder("commabot")
            .server("irc.example.org", 6667)
            .reply("!rules", "be nice")
            .ignored_url(r"https?://(www\.)?private\.example")
            .build()
            .unwrap();
        Replies::from_config(&config).unwrap()
    }

    #[test]
    fn static_replies() {
        let replies = replies();
        assert_eq!(replies.reply("ping", "alice").as_deref(), Some("pong alice"));
        assert_eq!(replies.reply("shrug", "alice").as_deref(), Some(SHRUG));
        assert_eq!(replies.reply(r"\o", "alice").as_deref(), Some("o/"));
        assert_eq!(replies.reply("o/", "alice").as_deref(), Some(r"\o"));
        assert_eq!(replies.reply("hello!", "alice").as_deref(), Some("Hello, alice!"));
        assert_eq!(replies.reply("Hi", "alice").as_deref(), Some("Hello, alice!"));
        assert_eq!(replies.reply("salut .", "bob").as_deref(), Some("Salut, bob!"));
        assert_eq!(replies.reply("!rules", "bob").as_deref(), Some("be nice"));
        assert_eq!(replies.reply("hi there", "alice"), None);
        assert_eq!(replies.reply("testing", "alice"), None);
    }

    #[test]
    fn url_scan() {
        let replies = replies();
        let found: Vec<_> = replies
            .urls("look https://example.org/a and http://private.example/x or ftp://x.y httpfoo")
            .collect();
        assert_eq!(found, vec!["https://example.org/a"]);
    }

    #[test]
    fn url_shapes() {
        assert!(is_url("http://a.b"));
        assert!(is_url("https://example.org/path?q=1"));
        assert!(!is_url("http:/"));
        assert!(!is_url("httpsomething"));
        assert!(!is_url("www.example.org"));
    }
}
