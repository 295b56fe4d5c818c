//! In-memory dispatch harness for unit tests.

use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::access::AccessList;
use crate::bot;
use crate::client::QuitHandle;
use crate::command::Command;
use crate::config::Config;
use crate::connection::Outbox;
use crate::context::Session;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::event_handler::Handlers;
use crate::services::GifSearch;
use crate::services::Services;
use crate::services::TitleFetcher;
use crate::tasks::log_join;
use crate::tasks::Tasks;

pub(crate) struct Harness {
    dispatcher: Dispatcher,
    pub access: Arc<AccessList>,
    sent: mpsc::UnboundedReceiver<Command>,
    quit_rx: mpsc::Receiver<()>,
}

impl Harness {
    /// A connected dispatcher with the bot's handlers and offline services.
    pub fn new(config: Config) -> Self {
        let access = Arc::new(AccessList::new(config.admins.iter().cloned()));
        let services = Services::offline(&config).unwrap();
        let (outbox, sent) = Outbox::channel();
        let (quit, quit_rx) = QuitHandle::channel();

        let mut handlers = Handlers::new();
        bot::register(&mut handlers);

        let mut session = Session::default();
        session.connect();

        Self {
            dispatcher: Dispatcher {
                tasks: Tasks::new(config.max_tasks),
                config: Arc::new(config),
                session,
                access: access.clone(),
                services,
                handlers,
                quit,
                outbox,
            },
            access,
            sent,
            quit_rx,
        }
    }

    /// Every line sent since the last call, in order.
    pub fn sent(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(command) = self.sent.try_recv() {
            lines.push(command.to_string());
        }
        lines
    }

    /// Waits for every spawned handler task.
    pub async fn settle(&mut self) {
        while !self.dispatcher.tasks.is_empty() {
            log_join(self.dispatcher.tasks.join_next().await);
        }
    }

    pub fn quit_requested(&mut self) -> bool {
        self.quit_rx.try_recv().is_ok()
    }
}

impl Deref for Harness {
    type Target = Dispatcher;

    fn deref(&self) -> &Self::Target {
        &self.dispatcher
    }
}

impl DerefMut for Harness {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.dispatcher
    }
}

pub(crate) struct StaticTitles(pub &'static str);

#[async_trait::async_trait]
impl TitleFetcher for StaticTitles {
    async fn fetch_title(&self, _: &str) -> Result<String, Error> {
        Ok(self.0.to_string())
    }
}

/// A fetch that never completes.
pub(crate) struct PendingTitles;

#[async_trait::async_trait]
impl TitleFetcher for PendingTitles {
    async fn fetch_title(&self, _: &str) -> Result<String, Error> {
        std::future::pending().await
    }
}

/// Echoes the query back as the reply.
pub(crate) struct StaticGifs;

#[async_trait::async_trait]
impl GifSearch for StaticGifs {
    async fn search_gif(&self, query: &str) -> Result<String, Error> {
        Ok(format!("[giphy] {query}"))
    }
}
