use std::future::Future;
use std::future::IntoFuture;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::access::Access;
use crate::access::AccessList;
use crate::bot;
use crate::config::Config;
use crate::connection::Connection;
use crate::context::Context;
use crate::context::Session;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::event::Event;
use crate::event_handler::Handlers;
use crate::services::Services;
use crate::tasks::log_join;
use crate::tasks::Tasks;

/// How long in-flight handler tasks get to finish once the loop ends.
const TASK_GRACE: Duration = Duration::from_secs(5);

/// Requests a graceful quit. Cloneable; only the first request counts.
#[derive(Debug, Clone)]
pub struct QuitHandle(mpsc::Sender<()>);

impl QuitHandle {
    pub(crate) fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self(tx), rx)
    }

    pub fn quit(&self) {
        let _ = self.0.try_send(());
    }
}

pub struct ClientBuilder {
    config: Config,
    access: Option<Arc<dyn Access>>,
    services: Option<Services>,
    handlers: Handlers,
}

impl ClientBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            access: None,
            services: None,
            handlers: Handlers::new(),
        }
    }

    /// Adds a handler for an event code. It runs after the bot's own.
    pub fn with_handler<F>(mut self, code: &str, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, &Event) + Send + Sync + 'static,
    {
        self.handlers.on(code, handler);
        self
    }

    pub fn with_ctcp_handler<F>(mut self, verb: &str, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, &Event) + Send + Sync + 'static,
    {
        self.handlers.on_ctcp(verb, handler);
        self
    }

    /// Replaces the in-memory admin and ignore lists.
    pub fn with_access<A: Access + 'static>(mut self, access: A) -> Self {
        self.access = Some(Arc::new(access));
        self
    }

    /// Replaces the HTTP-backed services.
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = Some(services);
        self
    }

    /// Builds a client over an already open stream.
    pub fn on_stream<S>(self, stream: S) -> Result<Client, Error>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.finish(Connection::from_stream(stream))
    }

    fn finish(self, connection: Connection) -> Result<Client, Error> {
        let services = match self.services {
            Some(services) => services,
            None => Services::from_config(&self.config)?,
        };
        let access: Arc<dyn Access> = match self.access {
            Some(access) => access,
            None => Arc::new(AccessList::new(self.config.admins.iter().cloned())),
        };

        let mut handlers = Handlers::new();
        bot::register(&mut handlers);
        handlers.extend(self.handlers);

        let (quit, quit_rx) = QuitHandle::channel();
        let mut session = Session::default();
        session.connect();

        Ok(Client {
            dispatcher: Dispatcher {
                tasks: Tasks::new(self.config.max_tasks),
                config: Arc::new(self.config),
                session,
                access,
                services,
                handlers,
                quit,
                outbox: connection.outbox().clone(),
            },
            connection,
            quit_rx,
        })
    }
}

impl IntoFuture for ClientBuilder {
    type Output = Result<Client, Error>;

    type IntoFuture = Pin<Box<dyn Future<Output = Result<Client, Error>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let server = &self.config.server;
            let connection =
                Connection::connect(&server.address, server.port, self.config.connect_timeout())
                    .await?;
            self.finish(connection)
        })
    }
}

enum Step {
    Line(String),
    Joined(Result<(), JoinError>),
    Quit,
    Lost(io::Error),
}

pub struct Client {
    connection: Connection,
    dispatcher: Dispatcher,
    quit_rx: mpsc::Receiver<()>,
}

impl Client {
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub fn quit_handle(&self) -> QuitHandle {
        self.dispatcher.quit.clone()
    }

    pub fn session(&self) -> Session {
        self.dispatcher.session
    }

    /// Dispatches inbound lines until a quit is requested or the connection
    /// is lost, then disconnects and winds down handler tasks.
    pub async fn run(mut self) -> Result<(), Error> {
        tracing::info!(nick = %self.dispatcher.config.nickname, "running");

        let result = loop {
            let step = tokio::select! {
                biased;
                Some(()) = self.quit_rx.recv() => Step::Quit,
                line = self.connection.next_line() => match line {
                    Some(Ok(line)) => Step::Line(line),
                    Some(Err(err)) => Step::Lost(err),
                    None => Step::Lost(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed")),
                },
                res = self.dispatcher.tasks.join_next() => Step::Joined(res),
            };

            match step {
                Step::Line(line) => self.dispatcher.dispatch(&line),
                Step::Joined(res) => log_join(res),
                Step::Quit => {
                    tracing::info!("quit requested");
                    break Ok(());
                }
                Step::Lost(err) => {
                    tracing::error!("read loop ended: {err}");
                    break Err(Error::Loop(err));
                }
            }
        };

        self.connection.disconnect().await;
        self.dispatcher.session.close();
        self.dispatcher.tasks.shutdown(TASK_GRACE).await;
        result
    }
}
