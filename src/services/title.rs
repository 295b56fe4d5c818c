use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::CONTENT_TYPE;

use super::TitleFetcher;
use crate::error::Error;
use crate::VERSION;

const TIMEOUT: Duration = Duration::from_secs(5);
const MAX_TITLE: usize = 150;
const MAX_BODY: usize = 512 * 1024;

/// Fetches page titles over HTTP.
pub struct HttpTitles {
    client: reqwest::Client,
}

impl HttpTitles {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(VERSION)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl TitleFetcher for HttpTitles {
    async fn fetch_title(&self, url: &str) -> Result<String, Error> {
        let mut resp = self.client.get(url).send().await.map_err(Error::Fetch)?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_type) = content_type.filter(|ct| !ct.contains("text/html")) {
            return Ok(match resp.content_length() {
                Some(len) => format!("content-type {content_type}, content-length {}", human_size(len)),
                None => format!("content-type {content_type}"),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(Error::Fetch)? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY {
                break;
            }
        }

        Ok(extract_title(&String::from_utf8_lossy(&body)))
    }
}

fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"))
}

pub fn extract_title(html: &str) -> String {
    let title = title_pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape(m.as_str()))
        .unwrap_or_default();

    let title = title.replace(['\r', '\n'], "");
    let title = title.trim();
    if title.is_empty() {
        return "[no title]".to_string();
    }

    match title.char_indices().nth(MAX_TITLE) {
        Some((end, _)) => format!("{} ...", &title[..end]),
        None => title.to_string(),
    }
}

fn unescape(text: &str) -> String {
    [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#x27;", "'"),
        ("&nbsp;", " "),
        ("&amp;", "&"),
    ]
    .iter()
    .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Binary-prefixed size, e.g. `1.5 MB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_html() {
        let html = "<html><head><TITLE lang=\"en\">\r\n  Rust &amp; IRC\n</TITLE></head></html>";
        assert_eq!(extract_title(html), "Rust & IRC");
    }

    #[test]
    fn missing_or_empty_title() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), "[no title]");
        assert_eq!(extract_title("<title>  </title>"), "[no title]");
    }

    #[test]
    fn long_titles_are_truncated() {
        let html = format!("<title>{}</title>", "é".repeat(200));
        let title = extract_title(&html);
        assert!(title.ends_with(" ..."));
        assert_eq!(title.trim_end_matches(" ...").chars().count(), MAX_TITLE);
    }

    #[test]
    fn sizes() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(1536 * 1024), "1.5 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
