//! Transport configuration.

use crate::error::*;
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

/// Namespace strings advertised in the opening handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    /// Default namespace of the stream content (`xmlns`)
    pub client: String,
    /// Namespace bound to the `stream:` prefix (`xmlns:stream`)
    pub stream: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Namespaces {
            client: "jabber:client".into(),
            stream: "http://etherx.jabber.org/streams".into(),
        }
    }
}

/// Configuration for a direct connection.
///
/// # Examples
///
/// ```
/// use stanza_stream::TransportConfig;
///
/// let config = TransportConfig {
///     port: 5223,
///     ..Default::default()
/// };
/// assert_eq!(config.namespaces.client, "jabber:client");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Host to connect to. The stream domain is used when unset.
    pub host: Option<String>,
    /// TCP port of the server
    pub port: u16,
    pub namespaces: Namespaces,
    /// Protocol version advertised in the opening handshake
    pub version: String,
    /// Name of the synthetic root element incoming chunks are wrapped in
    pub wrapper: String,
    /// Period of the idle tick that flushes the output queue
    pub idle_interval_ms: u64,
    /// Size of a single socket read
    pub read_buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            host: None,
            port: 5222,
            namespaces: Namespaces::default(),
            version: "1.0".into(),
            wrapper: "wrapper".into(),
            idle_interval_ms: 100,
            read_buffer_size: 8192,
        }
    }
}

impl TransportConfig {
    /// Parse a JSON configuration. Missing fields keep their defaults.
    ///
    /// ```
    /// use stanza_stream::TransportConfig;
    ///
    /// let config = TransportConfig::from_json(r#"{"host": "xmpp.example.com"}"#)?;
    /// assert_eq!(config.host.as_deref(), Some("xmpp.example.com"));
    /// assert_eq!(config.port, 5222);
    /// # Ok::<(), stanza_stream::Error>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TransportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ErrorKind::InvalidConfig("port must not be 0".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(ErrorKind::InvalidConfig(
                "read_buffer_size must not be 0".into(),
            ));
        }
        if self.idle_interval_ms == 0 {
            return Err(ErrorKind::InvalidConfig(
                "idle_interval_ms must not be 0".into(),
            ));
        }
        let bad_char = |c: char| c.is_whitespace() || c == '<' || c == '>' || c == '/';
        if self.wrapper.is_empty() || self.wrapper.contains(bad_char) {
            return Err(ErrorKind::InvalidConfig(format!(
                "invalid wrapper element name '{}'",
                self.wrapper
            )));
        }
        Ok(())
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Host the socket connects to for `domain`.
    pub fn connect_host<'a>(&'a self, domain: &'a str) -> &'a str {
        self.host.as_deref().unwrap_or(domain)
    }
}
