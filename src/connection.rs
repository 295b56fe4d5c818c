use std::io;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::error::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const QUIT_MESSAGE: &str = "Quitting";

const LINE_BUFFER: usize = 256;
/// Longest inbound line kept, terminator included.
const MAX_LINE: usize = 8192;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable handle to the outbound command queue.
#[derive(Debug, Clone)]
pub struct Outbox(mpsc::UnboundedSender<Command>);

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub fn send(&self, command: Command) {
        if let Err(err) = self.0.send(command) {
            tracing::debug!(line = %err.0.redacted(), "connection closed, dropping line");
        }
    }

    pub fn privmsg(&self, target: &str, text: impl Into<String>) {
        self.send(Command::privmsg(target, text))
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Owns the socket: a reader task feeding an ordered line channel and a
/// writer task draining the outbox.
pub struct Connection {
    outbox: Outbox,
    lines: mpsc::Receiver<io::Result<String>>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl Connection {
    pub async fn connect(address: &str, port: u16, timeout: Duration) -> Result<Self, Error> {
        let dest = format!("{address}:{port}");
        tracing::info!(server = %dest, "connecting");

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(&dest)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(Error::Dial { address: dest, source }),
            Err(..) => {
                return Err(Error::Dial {
                    address: dest,
                    source: io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("timed out after {timeout:?}"),
                    ),
                })
            }
        };
        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!("could not set TCP_NODELAY: {err}");
        }

        tracing::info!(server = %dest, "connected");
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        let (line_tx, lines) = mpsc::channel(LINE_BUFFER);
        let (outbox, commands) = Outbox::channel();

        Self {
            outbox,
            lines,
            reader: Some(tokio::spawn(read_loop(read, line_tx))),
            writer: Some(tokio::spawn(write_loop(write, commands))),
        }
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// The next inbound line in wire order. `None` once the reader is gone.
    pub async fn next_line(&mut self) -> Option<io::Result<String>> {
        self.lines.recv().await
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Sends QUIT, waits for the writer to flush and shut its half, then
    /// drops the reader, which closes the socket. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };

        self.outbox.send(Command::Quit(QUIT_MESSAGE.to_string()));
        if tokio::time::timeout(FLUSH_TIMEOUT, &mut writer).await.is_err() {
            tracing::warn!("writer did not flush in time");
            writer.abort();
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.lines.close();
        tracing::info!("disconnected");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for task in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

async fn read_loop<R>(read: R, lines: mpsc::Sender<io::Result<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(read);
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        let line = match (&mut reader).take(MAX_LINE as u64).read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(len) if len >= MAX_LINE && !buf.ends_with(b"\n") => {
                tracing::debug!(limit = MAX_LINE, "dropping oversized line");
                match skip_line(&mut reader).await {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(err) => {
                        let _ = lines.send(Err(err)).await;
                        break;
                    }
                }
            }
            Ok(..) => String::from_utf8_lossy(&buf)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            Err(err) => {
                let _ = lines.send(Err(err)).await;
                break;
            }
        };

        tracing::trace!("<- {}", line.escape_debug());
        if lines.send(Ok(line)).await.is_err() {
            break;
        }
    }
    tracing::debug!("read loop ended");
}

/// Discards input up to and including the next `\n`. `false` on EOF.
async fn skip_line<R>(reader: &mut R) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut scratch = Vec::with_capacity(512);
    loop {
        scratch.clear();
        if (&mut *reader).take(MAX_LINE as u64).read_until(b'\n', &mut scratch).await? == 0 {
            return Ok(false);
        }
        if scratch.ends_with(b"\n") {
            return Ok(true);
        }
    }
}

async fn write_loop<W>(mut write: W, mut commands: mpsc::UnboundedReceiver<Command>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        let line = command.to_string();
        // Never let a single command smuggle more than one line.
        let line = line.split(['\r', '\n']).next().unwrap_or_default();

        tracing::trace!("-> {}", command.redacted().escape_debug());
        if let Err(err) = write_line(&mut write, line).await {
            tracing::warn!("could not write to socket: {err}");
            break;
        }
        if command.is_quit() {
            break;
        }
    }

    commands.close();
    let _ = write.shutdown().await;
    tracing::debug!("write loop ended");
}

async fn write_line<W>(write: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write.write_all(line.as_bytes()).await?;
    write.write_all(b"\r\n").await?;
    write.flush().await
}
