//! Direct TCP transport binding for XML stanza streams.
//!
//! An XML messaging stream is one long document: the remote side opens an
//! envelope (`<stream:stream ...>`) that only closes when the session ends,
//! and the protocol units ("stanzas") travel inside it. This crate carries
//! such a stream over a plain, ordered byte socket:
//!
//! - on connect it writes the opening handshake,
//! - it accumulates the remote opening exchange until it can be parsed, then
//!   parses every further chunk into element trees,
//! - it queues outgoing units and writes them in order on each idle tick,
//! - it reports connection status changes and classifies socket closes as
//!   graceful or abnormal.
//!
//! What to send and how to react is left to a session layer implementing
//! [`SessionHandler`]; it drives the connection through the [`Transport`]
//! trait.
//!
//! The protocol logic lives in [`DirectConnection`] and the [`sansio`]
//! module and is independent of any runtime. With the `tokio` feature
//! (enabled by default) [`run_session`] drives it over a real TCP
//! connection:
//!
//!```no_run
//!# #[cfg(feature = "tokio")]
//!# mod example {
//!use stanza_stream::{Element, Outgoing, SessionHandler, Status, Transport, TransportConfig};
//!
//!struct Session;
//!
//!impl SessionHandler for Session {
//!    fn on_handshake_complete(&mut self, features: Element, transport: &mut dyn Transport) {
//!        if features.find_child("mechanisms").is_some() {
//!            transport.enqueue(Outgoing::Stanza(
//!                Element::new("auth")
//!                    .attr("xmlns", "urn:ietf:params:xml:ns:xmpp-sasl")
//!                    .attr("mechanism", "ANONYMOUS"),
//!            ));
//!        }
//!    }
//!
//!    fn on_data_received(&mut self, element: Element, _raw: String, transport: &mut dyn Transport) {
//!        if element.find_child("success").is_some() {
//!            transport.enqueue(Outgoing::Restart);
//!        }
//!    }
//!
//!    fn on_status_changed(&mut self, status: Status, message: Option<String>, _t: &mut dyn Transport) {
//!        eprintln!("{:?} {:?}", status, message);
//!    }
//!}
//!
//!async fn run() -> stanza_stream::Result<()> {
//!    let config = TransportConfig::from_json(r#"{"port": 5222}"#)?;
//!    stanza_stream::run_session(config, "example.com", &mut Session).await
//!}
//!# }
//!```

mod config;
mod connection;
mod element;
mod error;
pub mod sansio;
mod socket;
#[cfg(feature = "tokio")]
mod socket_async;

pub use crate::config::{Namespaces, TransportConfig};
pub use crate::connection::{DirectConnection, SessionHandler, Transport};
pub use crate::element::{Element, Node};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::sansio::{ConnectionEvent, LifecycleState, Outgoing, SocketEvent, SocketId, Status};
pub use crate::socket::{ByteSocket, Connector};
#[cfg(feature = "tokio")]
pub use crate::socket_async::{run_session, SocketEvents, TcpConnector, TcpSocket};
