//! Sans-IO pieces of the stream transport.
//!
//! Nothing in this module touches a socket:
//!
//! - [`StreamFramer`] turns received byte chunks into parsed [`Frame`]s
//! - [`OutputQueue`] holds outgoing units until the next flush
//! - [`protocol`] builds the envelope opening tag and prepares chunk text
//!
//! # Example
//!
//! ```
//! use stanza_stream::sansio::{Frame, StreamFramer};
//!
//! let mut framer = StreamFramer::new("wrapper");
//! framer.arm();
//!
//! // the envelope opening alone is not a document yet
//! framer.handle_input(b"<stream:stream xmlns:stream='http://etherx.jabber.org/streams'>")?;
//! assert!(framer.poll_frame().is_none());
//!
//! framer.handle_input(b"<stream:features/></stream:stream>")?;
//! match framer.poll_frame() {
//!     Some(Frame::Handshake { document, .. }) => {
//!         let stream = document.first_child().unwrap();
//!         assert_eq!(stream.first_child().unwrap().local_name(), "features");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok::<(), stanza_stream::Error>(())
//! ```

pub mod framer;
pub mod protocol;
pub mod queue;
pub mod types;

pub use self::framer::StreamFramer;
pub use self::queue::OutputQueue;
pub use self::types::{
    ConnectionEvent, Frame, LifecycleState, Outgoing, SocketEvent, SocketId, Status,
};
