//! The byte socket abstraction the connection writes to.
//!
//! A socket only moves bytes. Everything it observes (connected, data,
//! error, closed) is reported as a [`SocketEvent`](crate::sansio::SocketEvent) tagged with the socket's
//! [`SocketId`] and routed back into
//! [`DirectConnection::handle_socket_event`](crate::DirectConnection::handle_socket_event)
//! by whoever drives the connection.

use crate::error::*;
use crate::sansio::SocketId;

/// One bidirectional byte socket.
pub trait ByteSocket {
    fn id(&self) -> SocketId;

    /// Queue `bytes` for transmission after everything written before.
    /// Must not block.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Finish the connection. Pending writes are still sent, then the write
    /// side is shut down; the socket raises [`SocketEvent::Closed`](crate::sansio::SocketEvent::Closed) once
    /// the peer is done too.
    ///
    /// Idempotent. Failures are swallowed.
    fn close(&mut self);
}

/// Opens sockets.
pub trait Connector {
    type Socket: ByteSocket;

    /// Start connecting to `host:port`. The returned socket raises exactly
    /// one of [`SocketEvent::Connected`](crate::sansio::SocketEvent::Connected) or [`SocketEvent::Error`](crate::sansio::SocketEvent::Error) later.
    /// An `Err` here means no attempt could be started at all.
    fn connect(&mut self, host: &str, port: u16) -> Result<Self::Socket>;
}
