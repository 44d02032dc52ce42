use std::io;

#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("IO error: {0:?}")]
    Io(io::ErrorKind),
    #[error("Malformed XML: {0}")]
    Xml(String),
    #[error("Document ended with an unclosed element <{0}>")]
    UnclosedElement(String),
    #[error("Document has no root element")]
    EmptyDocument,
    #[error("Document has more than one root element")]
    MultipleRoots,
    #[error("Transport is not connected")]
    NotConnected,
    #[error("Server did not send any auth methods")]
    NoFeatures,
    #[error("Invalid transport configuration: {0}")]
    InvalidConfig(String),
    #[error("Connection Closed")]
    ConnectionClosed,
}

impl From<io::Error> for ErrorKind {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset => ErrorKind::ConnectionClosed,
            kind => ErrorKind::Io(kind),
        }
    }
}

impl From<quick_xml::Error> for ErrorKind {
    fn from(e: quick_xml::Error) -> Self {
        ErrorKind::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ErrorKind {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ErrorKind::Xml(e.to_string())
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::InvalidConfig(e.to_string())
    }
}

pub type Error = ErrorKind;
pub type Result<T> = std::result::Result<T, Error>;
