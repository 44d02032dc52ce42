//! Tokio TCP binding and session driver.
//!
//! [`TcpConnector`] opens [`TcpSocket`]s. Each socket is serviced by its own
//! task, which reports what it observes over one event channel shared by
//! all sockets of the connector. [`run_session`] ties it together: it owns
//! a [`DirectConnection`], feeds it socket events and idle ticks one at a
//! time, and dispatches the resulting callbacks to the session handler.

use crate::config::TransportConfig;
use crate::connection::{DirectConnection, SessionHandler, Transport};
use crate::error::*;
use crate::sansio::{SocketEvent, SocketId};
use crate::socket::{ByteSocket, Connector};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiving end of the event channel of a [`TcpConnector`].
pub type SocketEvents = mpsc::UnboundedReceiver<(SocketId, SocketEvent)>;

#[derive(Debug)]
enum Command {
    Write(Vec<u8>),
    Close,
}

/// Handle to a TCP connection serviced by a background task.
///
/// Writes and the close request are queued in order. Dropping the handle
/// aborts the connection without waiting for the peer.
#[derive(Debug)]
pub struct TcpSocket {
    id: SocketId,
    commands: mpsc::UnboundedSender<Command>,
    closed: bool,
}

impl ByteSocket for TcpSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ErrorKind::ConnectionClosed);
        }
        self.commands
            .send(Command::Write(bytes.to_vec()))
            .map_err(|_| ErrorKind::ConnectionClosed)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.commands.send(Command::Close);
        }
    }
}

/// Opens [`TcpSocket`]s on the current tokio runtime.
#[derive(Debug)]
pub struct TcpConnector {
    events: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
    next_id: u64,
    read_buffer_size: usize,
}

impl TcpConnector {
    /// Create a connector and the channel its sockets report on.
    pub fn new(read_buffer_size: usize) -> (Self, SocketEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            TcpConnector {
                events,
                next_id: 0,
                read_buffer_size,
            },
            rx,
        )
    }
}

impl Connector for TcpConnector {
    type Socket = TcpSocket;

    fn connect(&mut self, host: &str, port: u16) -> Result<TcpSocket> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| ErrorKind::Io(std::io::ErrorKind::Other))?;

        self.next_id += 1;
        let id = SocketId(self.next_id);
        let (commands, rx) = mpsc::unbounded_channel();
        handle.spawn(service_socket(
            id,
            host.to_string(),
            port,
            rx,
            self.events.clone(),
            self.read_buffer_size,
        ));

        Ok(TcpSocket {
            id,
            commands,
            closed: false,
        })
    }
}

/// Connect, then shuttle bytes until the connection is finished.
async fn service_socket(
    id: SocketId,
    host: String,
    port: u16,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
    read_buffer_size: usize,
) {
    let stream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = events.send((id, SocketEvent::Error(e)));
            return;
        }
    };
    let _ = events.send((id, SocketEvent::Connected));

    let (mut reader, mut writer) = stream.into_split();
    let mut buf = vec![0u8; read_buffer_size];
    let mut write_open = true;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Write(bytes)) if write_open => {
                    if let Err(e) = writer.write_all(&bytes).await {
                        let _ = events.send((id, SocketEvent::Error(e)));
                        break;
                    }
                }
                Some(Command::Write(_)) => {}
                Some(Command::Close) => {
                    if write_open {
                        write_open = false;
                        // best effort; the peer may already be gone
                        let _ = writer.shutdown().await;
                    }
                }
                None => {
                    debug!(socket = %id, "Socket handle dropped, aborting connection");
                    return;
                }
            },
            res = reader.read(&mut buf) => match res {
                Ok(0) => break,
                Ok(n) => {
                    let _ = events.send((id, SocketEvent::Data(buf[..n].to_vec())));
                }
                Err(e) => {
                    let _ = events.send((id, SocketEvent::Error(e)));
                    break;
                }
            },
        }
    }

    let _ = events.send((id, SocketEvent::Closed));
}

/// Run one session over a direct TCP connection to `domain`.
///
/// Returns once the connection has ended and the handler did not start a
/// new one from its callbacks. Connection failures are reported to the
/// handler through its status callback; only an invalid configuration or a
/// missing runtime yield an `Err`.
///
/// # Examples
///
/// ```no_run
/// use stanza_stream::{run_session, Element, SessionHandler, Transport, TransportConfig};
///
/// struct Session;
///
/// impl SessionHandler for Session {
///     fn on_handshake_complete(&mut self, features: Element, transport: &mut dyn Transport) {
///         println!("features: {}", features);
///         transport.disconnect(Some(Element::new("presence").attr("type", "unavailable")));
///     }
///
///     fn on_data_received(&mut self, element: Element, _raw: String, _t: &mut dyn Transport) {
///         println!("received: {}", element);
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> stanza_stream::Result<()> {
/// run_session(TransportConfig::default(), "example.com", &mut Session).await
/// # }
/// ```
pub async fn run_session<H: SessionHandler + ?Sized>(
    config: TransportConfig,
    domain: &str,
    handler: &mut H,
) -> Result<()> {
    config.validate()?;

    let (connector, mut events) = TcpConnector::new(config.read_buffer_size);
    let mut idle = tokio::time::interval(config.idle_interval());
    let mut conn = DirectConnection::new(config, connector);

    let res = conn.connect(domain);
    conn.dispatch(handler);
    res?;

    while conn.state().has_socket() {
        tokio::select! {
            Some((id, event)) = events.recv() => conn.handle_socket_event(id, event),
            _ = idle.tick() => conn.on_idle_tick(),
        }
        conn.dispatch(handler);
    }

    Ok(())
}
