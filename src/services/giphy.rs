use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Deserialize;

use super::GifSearch;
use crate::error::Error;
use crate::VERSION;

const SEARCH_URL: &str = "https://api.giphy.com/v1/gifs/search";
const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Gif>,
}

#[derive(Debug, Deserialize)]
struct Gif {
    #[serde(default)]
    url: String,
    #[serde(default)]
    bitly_url: String,
    #[serde(default)]
    rating: String,
}

/// Giphy search API client.
pub struct Giphy {
    client: reqwest::Client,
    api_key: String,
    limit: u8,
}

impl Giphy {
    pub fn new(api_key: &str, limit: u8) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(VERSION)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            limit,
        })
    }
}

#[async_trait::async_trait]
impl GifSearch for Giphy {
    async fn search_gif(&self, query: &str) -> Result<String, Error> {
        let limit = self.limit.to_string();
        let resp: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::Search)?
            .json()
            .await
            .map_err(Error::Search)?;

        let gif = resp.data.choose(&mut rand::thread_rng());
        Ok(format_reply(gif))
    }
}

fn format_reply(gif: Option<&Gif>) -> String {
    let Some(gif) = gif else {
        return "[giphy] no GIFs found :(".to_string();
    };
    let link = if gif.bitly_url.is_empty() {
        &gif.url
    } else {
        &gif.bitly_url
    };
    let nsfw = if gif.rating == "r" { "NSFW " } else { "" };
    format!("[giphy] {nsfw}{link}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_search_response() {
        let json = r#"{
            "data": [{"id": "x", "url": "https://giphy.com/gifs/x", "bitly_url": "https://gph.is/x", "rating": "g"}],
            "pagination": {"total_count": 1, "count": 1, "offset": 0},
            "meta": {"status": 200, "msg": "OK"}
        }"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(format_reply(resp.data.first()), "[giphy] https://gph.is/x");
    }

    #[test]
    fn nsfw_and_empty() {
        let gif = Gif {
            url: "https://giphy.com/gifs/y".into(),
            bitly_url: String::new(),
            rating: "r".into(),
        };
        assert_eq!(format_reply(Some(&gif)), "[giphy] NSFW https://giphy.com/gifs/y");
        assert_eq!(format_reply(None), "[giphy] no GIFs found :(");
    }
}
