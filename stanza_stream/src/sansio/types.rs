//! Core types shared by the framing state machines and the connection.

use crate::Element;
use std::fmt;
use std::io;

/// Identifies one socket instance. Events carry the id of the socket that
/// raised them so events of a replaced socket can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Events raised by a byte socket.
#[derive(Debug)]
pub enum SocketEvent {
    /// The TCP connection was established
    Connected,
    /// Bytes arrived, in stream order
    Data(Vec<u8>),
    /// Connecting failed, or the socket failed after connecting
    Error(io::Error),
    /// The connection is finished; raised once per established connection
    Closed,
}

/// Output of the stream framer.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// The buffered opening exchange, parsed inside the synthetic root
    Handshake {
        /// The synthetic root holding the envelope and its content
        document: Element,
        /// Accumulated text with the XML declaration removed
        raw: String,
    },
    /// One chunk of stanzas, parsed inside the synthetic root
    Stanzas {
        /// The synthetic root holding the stanzas of the chunk
        document: Element,
        /// The chunk text as received
        raw: String,
    },
    /// The remote side closed the envelope
    StreamEnd,
}

/// An entry of the output queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// A unit serialized and written as-is
    Stanza(Element),
    /// Re-emit the opening handshake instead of a literal unit
    Restart,
}

impl From<Element> for Outgoing {
    fn from(e: Element) -> Self {
        Outgoing::Stanza(e)
    }
}

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No connect was ever requested
    Idle,
    /// Socket opened, TCP connection pending
    Connecting,
    /// Opening handshake sent
    Connected,
    /// Disconnect requested, waiting for the socket to close
    Disconnecting,
    /// Socket closed and released
    Disconnected,
}

impl LifecycleState {
    /// Whether a socket reference is held in this state.
    pub fn has_socket(self) -> bool {
        matches!(
            self,
            LifecycleState::Connecting | LifecycleState::Connected | LifecycleState::Disconnecting
        )
    }
}

/// Connection status reported to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Connecting,
    /// The connection could not be established or failed
    ConnFail,
    Disconnecting,
    Disconnected,
    /// The connection terminated abnormally
    Error,
}

/// Notifications for the session, drained with `poll_event()`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    HandshakeComplete {
        /// The `features` element offered by the remote side
        features: Element,
    },
    DataReceived {
        /// The synthetic root holding the received stanzas
        element: Element,
        raw: String,
    },
    StatusChanged {
        status: Status,
        message: Option<String>,
    },
    ForcedDisconnect,
    XmlInput(Element),
    RawInput(String),
    XmlOutput(Element),
    RawOutput(String),
}
