//! Connection lifecycle of the direct stream transport.
//!
//! [`DirectConnection`] owns the socket, the [`StreamFramer`] and the
//! [`OutputQueue`] of one connection and turns socket events into
//! [`ConnectionEvent`]s for the session. It never blocks and never spawns:
//! whoever drives it feeds socket events in with
//! [`DirectConnection::handle_socket_event`], calls
//! [`DirectConnection::on_idle_tick`] periodically, and hands the queued
//! events to a [`SessionHandler`] with [`DirectConnection::dispatch`].

use crate::config::TransportConfig;
use crate::error::*;
use crate::sansio::protocol::{build_stream, is_unavailable_presence, STREAM_NAME};
use crate::sansio::{
    ConnectionEvent, Frame, LifecycleState, OutputQueue, Outgoing, SocketEvent, SocketId, Status,
    StreamFramer,
};
use crate::socket::{ByteSocket, Connector};
use crate::Element;
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

const CONNFAIL_MESSAGE: &str =
    "The direct connection could not be established and was disconnected.";
const UNEXPECTED_CLOSE_MESSAGE: &str = "Socket closed unexpectedly";

/// What the session layer can ask of a transport.
pub trait Transport {
    /// Open a new connection to `domain`, replacing any current socket.
    fn connect(&mut self, domain: &str) -> Result<()>;

    /// Write `final_unit` (if any) directly, then close the socket.
    fn disconnect(&mut self, final_unit: Option<Element>);

    /// Queue a unit or a restart for the next flush.
    fn enqueue(&mut self, entry: Outgoing);

    /// Write out everything queued, unless sending is paused.
    fn flush(&mut self);
}

/// Callbacks into the session layer.
///
/// Every callback that may want to react by sending gets the transport.
#[allow(unused_variables)]
pub trait SessionHandler {
    /// The socket connected and the opening handshake was written.
    fn on_connected(&mut self, transport: &mut dyn Transport) {}

    /// The remote side completed its opening exchange and offered `features`.
    fn on_handshake_complete(&mut self, features: Element, transport: &mut dyn Transport);

    /// A chunk of stanzas arrived. `element` is the synthetic root holding
    /// them, `raw` the text they were parsed from.
    fn on_data_received(&mut self, element: Element, raw: String, transport: &mut dyn Transport);

    fn on_status_changed(
        &mut self,
        status: Status,
        message: Option<String>,
        transport: &mut dyn Transport,
    ) {
    }

    /// The connection ended without being asked to.
    fn on_forced_disconnect(&mut self, transport: &mut dyn Transport) {}

    fn xml_input(&mut self, element: &Element) {}
    fn raw_input(&mut self, raw: &str) {}
    fn xml_output(&mut self, element: &Element) {}
    fn raw_output(&mut self, raw: &str) {}
}

/// A stream transport over one direct byte socket at a time.
pub struct DirectConnection<C: Connector> {
    config: TransportConfig,
    connector: C,
    domain: Option<String>,
    state: LifecycleState,
    socket: Option<C::Socket>,
    /// Our side was closed after the remote envelope close; nothing more
    /// may be written while waiting for the socket to finish.
    remote_closed: bool,
    framer: StreamFramer,
    queue: OutputQueue,
    pending_events: VecDeque<ConnectionEvent>,
}

impl<C: Connector> DirectConnection<C> {
    pub fn new(config: TransportConfig, connector: C) -> Self {
        let framer = StreamFramer::new(config.wrapper.clone());
        DirectConnection {
            config,
            connector,
            domain: None,
            state: LifecycleState::Idle,
            socket: None,
            remote_closed: false,
            framer,
            queue: OutputQueue::new(),
            pending_events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Domain of the current or last connection.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Id of the socket currently held, if any.
    pub fn socket_id(&self) -> Option<SocketId> {
        self.socket.as_ref().map(|s| s.id())
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Bytes of the opening exchange received so far.
    pub fn handshake_buffer(&self) -> &[u8] {
        self.framer.buffered()
    }

    pub fn is_paused(&self) -> bool {
        self.queue.is_paused()
    }

    /// Stop flushing. Queued units stay queued.
    pub fn pause(&mut self) {
        self.queue.set_paused(true);
    }

    pub fn resume(&mut self) {
        self.queue.set_paused(false);
    }

    /// Next notification for the session.
    pub fn poll_event(&mut self) -> Option<ConnectionEvent> {
        self.pending_events.pop_front()
    }

    /// Deliver all pending notifications to `handler`, including the ones
    /// caused by the handler's own reactions.
    pub fn dispatch<H: SessionHandler + ?Sized>(&mut self, handler: &mut H) {
        while let Some(event) = self.poll_event() {
            match event {
                ConnectionEvent::Connected => handler.on_connected(self),
                ConnectionEvent::HandshakeComplete { features } => {
                    handler.on_handshake_complete(features, self)
                }
                ConnectionEvent::DataReceived { element, raw } => {
                    handler.on_data_received(element, raw, self)
                }
                ConnectionEvent::StatusChanged { status, message } => {
                    handler.on_status_changed(status, message, self)
                }
                ConnectionEvent::ForcedDisconnect => handler.on_forced_disconnect(self),
                ConnectionEvent::XmlInput(element) => handler.xml_input(&element),
                ConnectionEvent::RawInput(raw) => handler.raw_input(&raw),
                ConnectionEvent::XmlOutput(element) => handler.xml_output(&element),
                ConnectionEvent::RawOutput(raw) => handler.raw_output(&raw),
            }
        }
    }

    /// Route an event raised by socket `id`. Events of any socket other
    /// than the one currently held are dropped.
    pub fn handle_socket_event(&mut self, id: SocketId, event: SocketEvent) {
        if self.socket_id() != Some(id) {
            debug!(socket = %id, ?event, "Dropping event of a released socket");
            return;
        }

        match event {
            SocketEvent::Connected => self.on_socket_connected(),
            SocketEvent::Data(bytes) => self.on_socket_data(&bytes),
            SocketEvent::Error(e) => {
                error!(socket = %id, error = %e, "Socket error");
                self.fail(CONNFAIL_MESSAGE);
            }
            SocketEvent::Closed => self.on_socket_closed(),
        }
    }

    /// Periodic tick from the session scheduler: the only point at which
    /// queued units are written.
    pub fn on_idle_tick(&mut self) {
        self.flush_queue();
    }

    /// The remote side offered no features after the opening exchange.
    ///
    /// Reports the failure, closes the socket and then runs `continuation`.
    pub fn no_features_received(&mut self, continuation: Option<Box<dyn FnOnce(&mut Self)>>) {
        error!(domain = ?self.domain, "Server did not send any auth methods");
        self.push_status(Status::ConnFail, Some(ErrorKind::NoFeatures.to_string()));
        self.force_disconnect();
        if let Some(continuation) = continuation {
            continuation(self);
        }
    }

    fn on_socket_connected(&mut self) {
        if self.state != LifecycleState::Connecting {
            warn!(state = ?self.state, "Connected event outside of connecting state");
            return;
        }
        info!(domain = ?self.domain, "Connection opened");

        self.framer.arm();
        self.state = LifecycleState::Connected;
        if self.write_open_stream().is_ok() {
            self.pending_events.push_back(ConnectionEvent::Connected);
        }
    }

    fn on_socket_data(&mut self, bytes: &[u8]) {
        if let Err(e) = self.framer.handle_input(bytes) {
            error!(error = %e, "Could not parse received data");
            self.push_status(Status::ConnFail, Some(e.to_string()));
            self.force_disconnect();
            return;
        }

        while let Some(frame) = self.framer.poll_frame() {
            match frame {
                Frame::Handshake { document, raw } => {
                    self.pending_events
                        .push_back(ConnectionEvent::XmlInput(document.clone()));
                    self.pending_events.push_back(ConnectionEvent::RawInput(raw));
                    let features = document
                        .first_child()
                        .filter(|stream| stream.name() == STREAM_NAME)
                        .and_then(|stream| stream.find_child("features"))
                        .cloned();
                    match features {
                        Some(features) => self
                            .pending_events
                            .push_back(ConnectionEvent::HandshakeComplete { features }),
                        None => self.no_features_received(None),
                    }
                }
                Frame::Stanzas { document, raw } => {
                    // Narrow teardown case: only an unavailable presence is
                    // handed to the observers here; the socket stays open
                    // until the envelope-closing tag arrives.
                    if self.state == LifecycleState::Disconnecting
                        && is_unavailable_presence(&document)
                    {
                        debug!("Unavailable presence while disconnecting");
                        self.pending_events
                            .push_back(ConnectionEvent::XmlInput(document));
                        self.pending_events.push_back(ConnectionEvent::RawInput(raw));
                        continue;
                    }
                    self.pending_events.push_back(ConnectionEvent::DataReceived {
                        element: document,
                        raw,
                    });
                }
                Frame::StreamEnd => {
                    info!(state = ?self.state, "Remote side closed the stream");
                    self.remote_closed = true;
                    if let Some(socket) = self.socket.as_mut() {
                        socket.close();
                    }
                }
            }
        }
    }

    fn on_socket_closed(&mut self) {
        match self.state {
            LifecycleState::Disconnecting => {
                info!(domain = ?self.domain, "Socket closed");
                self.release();
                self.push_status(Status::Disconnected, None);
            }
            LifecycleState::Connecting | LifecycleState::Connected => {
                error!(domain = ?self.domain, "Socket closed unexpectedly");
                self.release();
                self.push_status(Status::Error, Some(UNEXPECTED_CLOSE_MESSAGE.into()));
                self.pending_events.push_back(ConnectionEvent::ForcedDisconnect);
            }
            LifecycleState::Idle | LifecycleState::Disconnected => {}
        }
    }

    /// Transport failure: report it, then drop the connection.
    fn fail(&mut self, message: &str) {
        self.push_status(Status::ConnFail, Some(message.into()));
        self.force_disconnect();
    }

    /// Close and discard the socket without waiting for it to finish.
    fn force_disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            socket.close();
        }
        self.release();
    }

    /// Forget everything scoped to the current socket.
    fn release(&mut self) {
        self.socket = None;
        self.remote_closed = false;
        self.framer.reset();
        self.queue.clear();
        self.state = LifecycleState::Disconnected;
    }

    fn push_status(&mut self, status: Status, message: Option<String>) {
        self.pending_events
            .push_back(ConnectionEvent::StatusChanged { status, message });
    }

    fn open_stream(&self) -> Element {
        build_stream(&self.config, self.domain.as_deref().unwrap_or_default())
    }

    fn write_open_stream(&mut self) -> Result<()> {
        let open = self.open_stream();
        let raw = open.open_tag();
        self.write_raw(open, raw)
    }

    /// Write one serialized unit, reporting it to the output observers.
    /// A failed write takes the connection down, unless the remote side
    /// already closed the stream.
    fn write_raw(&mut self, element: Element, raw: String) -> Result<()> {
        let socket = match self.socket.as_mut() {
            Some(socket) => socket,
            None => return Err(ErrorKind::NotConnected),
        };
        if let Err(e) = socket.write(raw.as_bytes()) {
            if self.remote_closed {
                // the closed event that follows reports the end
                debug!(error = %e, "Write after remote stream close dropped");
            } else {
                error!(error = %e, "Socket write failed");
                self.fail(CONNFAIL_MESSAGE);
            }
            return Err(e);
        }
        self.pending_events
            .push_back(ConnectionEvent::XmlOutput(element));
        self.pending_events.push_back(ConnectionEvent::RawOutput(raw));
        Ok(())
    }

    fn flush_queue(&mut self) {
        if !self.queue.is_ready() || self.state != LifecycleState::Connected {
            return;
        }
        if self.remote_closed {
            debug!(count = self.queue.len(), "Stream closed by remote side, not flushing");
            return;
        }

        let entries = self.queue.take();
        debug!(count = entries.len(), "Flushing output queue");
        for entry in entries {
            let res = match entry {
                Outgoing::Stanza(element) => {
                    let raw = element.to_xml();
                    self.write_raw(element, raw)
                }
                Outgoing::Restart => self.write_open_stream(),
            };
            if res.is_err() {
                return;
            }
        }
    }
}

impl<C: Connector> Transport for DirectConnection<C> {
    fn connect(&mut self, domain: &str) -> Result<()> {
        if let Some(old) = self.socket.take() {
            debug!(socket = %old.id(), "Discarding previous socket");
        }
        self.release();
        self.domain = Some(domain.to_string());
        self.state = LifecycleState::Connecting;
        self.push_status(Status::Connecting, None);

        let host = self.config.connect_host(domain).to_string();
        let port = self.config.port;
        info!(%host, port, %domain, "Connecting");
        match self.connector.connect(&host, port) {
            Ok(socket) => {
                self.socket = Some(socket);
                Ok(())
            }
            Err(e) => {
                error!(%host, port, error = %e, "Could not open socket");
                self.state = LifecycleState::Disconnected;
                self.push_status(Status::ConnFail, Some(CONNFAIL_MESSAGE.into()));
                Err(e)
            }
        }
    }

    fn disconnect(&mut self, final_unit: Option<Element>) {
        match self.state {
            LifecycleState::Connected => {
                if let Some(unit) = final_unit.filter(|_| !self.remote_closed) {
                    let raw = unit.to_xml();
                    if self.write_raw(unit, raw).is_err() {
                        return;
                    }
                }
                self.state = LifecycleState::Disconnecting;
                self.push_status(Status::Disconnecting, None);
                if let Some(socket) = self.socket.as_mut() {
                    socket.close();
                }
            }
            LifecycleState::Connecting => {
                // nothing was exchanged yet, so there is nothing to finish
                self.force_disconnect();
                self.push_status(Status::Disconnected, None);
            }
            LifecycleState::Disconnecting => {}
            LifecycleState::Idle | LifecycleState::Disconnected => {
                debug!("Disconnect requested without a connection");
            }
        }
    }

    fn enqueue(&mut self, entry: Outgoing) {
        self.queue.enqueue(entry);
    }

    fn flush(&mut self) {
        self.flush_queue();
    }
}
