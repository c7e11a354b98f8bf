//! TCP connection to the editor.
//!
//! Wraps a `TcpStream` in a [`Framed`] transport with [`TrackerCodec`]
//! and moves I/O onto background tasks, so the session itself never
//! blocks: outgoing frames are queued on a channel, inbound frames are
//! delivered through [`EditorConnection::recv`].

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::TrackerCodec;
use crate::error::SyncError;
use crate::message::{CLIENT_GREETING, Command};

/// Sender half handed to the session as its [`CommandSink`].
///
/// [`CommandSink`]: crate::session::CommandSink
pub type CommandSender = mpsc::UnboundedSender<Command>;

/// A live connection to a sync editor.
#[derive(Debug)]
pub struct EditorConnection {
    // Channel to the background writer task
    tx: CommandSender,
    // Channel from the background reader task
    rx: mpsc::Receiver<Command>,
}

impl EditorConnection {
    /// Connect to `info`, send the client greeting, and start the
    /// background I/O tasks.
    ///
    /// The editor's answering greeting arrives through [`recv`] as
    /// [`Command::Handshake`] once it is on the wire.
    ///
    /// [`recv`]: EditorConnection::recv
    pub async fn connect(info: &ConnectionInfo) -> Result<Self, SyncError> {
        let mut stream = TcpStream::connect(info.addr()).await?;
        stream.write_all(CLIENT_GREETING).await?;
        debug!(addr = %info.addr(), "connected, greeting sent");
        Ok(Self::new(stream))
    }

    /// Wrap an already-greeted stream. The codec starts fresh, so any
    /// partial frame from a previous connection is gone.
    pub fn new(stream: TcpStream) -> Self {
        let (mut net_writer, mut net_reader) = Framed::new(stream, TrackerCodec::new()).split();

        // Session -> Network. Unbounded so the session can queue frames
        // from synchronous code (advance runs inside the host's frame
        // loop); traffic is already throttled to one frame per row.
        let (user_tx, mut network_rx) = mpsc::unbounded_channel();

        // Network -> Session
        let (network_tx, user_rx) = mpsc::channel(100);

        // Writer task
        tokio::spawn(async move {
            while let Some(cmd) = network_rx.recv().await {
                if let Err(e) = net_writer.send(cmd).await {
                    warn!(error = %e, "network write failed");
                    break;
                }
            }
        });

        // Reader task. A decode error (bad greeting, hostile length) or
        // EOF ends the task, which closes the channel; the host observes
        // that as `recv() == None` and tears the session down.
        tokio::spawn(async move {
            while let Some(result) = net_reader.next().await {
                match result {
                    Ok(cmd) => {
                        if network_tx.send(cmd).await.is_err() {
                            // receiver dropped, stop reading
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "network read failed");
                        break;
                    }
                }
            }
        });

        Self {
            tx: user_tx,
            rx: user_rx,
        }
    }

    /// Next decoded frame, or `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }

    /// Clone the outgoing sender for the session.
    pub fn sender(&self) -> CommandSender {
        self.tx.clone()
    }
}

// ── ConnectionInfo ───────────────────────────────────────────────

/// Editor endpoint. Rocket editors listen on 1338 by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub const DEFAULT_PORT: u16 = 1338;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `"host:port"`, defaulting the port when absent.
    ///
    /// An empty host is a fatal configuration error, reported here at
    /// construction rather than as a runtime protocol error.
    pub fn parse(addr: &str) -> Result<Self, SyncError> {
        let (host, port) = match addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| SyncError::Config(format!("invalid port in {addr:?}")))?;
                (host, port)
            }
            None => (addr, Self::DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(SyncError::Config("editor host must not be empty".into()));
        }
        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr())
    }
}
