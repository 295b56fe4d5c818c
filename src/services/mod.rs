use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;

mod giphy;
mod replies;
mod title;

pub use giphy::Giphy;
pub use replies::Replies;
pub use title::human_size;
pub use title::HttpTitles;

#[async_trait::async_trait]
pub trait TitleFetcher: Send + Sync {
    /// A one-line description of the page behind `url`.
    async fn fetch_title(&self, url: &str) -> Result<String, Error>;
}

#[async_trait::async_trait]
pub trait GifSearch: Send + Sync {
    /// The full reply text for a search.
    async fn search_gif(&self, query: &str) -> Result<String, Error>;
}

/// The slow or stateful collaborators the bot leans on.
#[derive(Clone)]
pub struct Services {
    pub titles: Option<Arc<dyn TitleFetcher>>,
    pub gifs: Option<Arc<dyn GifSearch>>,
    pub replies: Arc<Replies>,
}

impl Services {
    /// HTTP-backed services; GIF search only when an API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let titles = HttpTitles::new().map_err(Error::Fetch)?;
        let gifs = match &config.giphy {
            Some(giphy) => {
                let gifs = Giphy::new(&giphy.api_key, giphy.limit).map_err(Error::Search)?;
                Some(Arc::new(gifs) as Arc<dyn GifSearch>)
            }
            None => None,
        };

        Ok(Self {
            titles: Some(Arc::new(titles)),
            gifs,
            replies: Arc::new(Replies::from_config(config)?),
        })
    }

    /// No network collaborators, only the static replies.
    pub fn offline(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            titles: None,
            gifs: None,
            replies: Arc::new(Replies::from_config(config)?),
        })
    }
}
