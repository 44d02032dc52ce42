//! Inbound framing: turns arbitrarily chunked socket bytes into parsed
//! element trees.
//!
//! The first thing the remote side sends is the envelope opening tag, which
//! stays open until the whole session ends, so it can never be parsed as a
//! document on its own. The framer therefore starts out *armed*: it
//! accumulates every chunk until the envelope-closing tag shows up in the
//! buffer, then parses the whole buffer at once inside a synthetic root.
//! After that it is disarmed and every chunk is parsed independently.

use super::protocol::{parse_wrapped, strip_xml_declaration, STREAM_CLOSE};
use super::types::Frame;
use crate::error::*;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct StreamFramer {
    /// Name of the synthetic root element
    wrapper: String,
    /// Accumulated bytes while the opening exchange is incomplete
    handshake: Option<Vec<u8>>,
    /// Trailing bytes of a UTF-8 sequence split across chunks
    utf8_tail: Vec<u8>,
    pending_frames: VecDeque<Frame>,
}

impl StreamFramer {
    /// Create a disarmed framer. Call [`StreamFramer::arm`] when a socket
    /// connects.
    pub fn new<S: Into<String>>(wrapper: S) -> Self {
        StreamFramer {
            wrapper: wrapper.into(),
            handshake: None,
            utf8_tail: Vec::new(),
            pending_frames: VecDeque::new(),
        }
    }

    /// Start accumulating the opening exchange of a fresh connection.
    pub fn arm(&mut self) {
        self.reset();
        self.handshake = Some(Vec::new());
    }

    /// Drop all buffered input and pending frames.
    pub fn reset(&mut self) {
        self.handshake = None;
        self.utf8_tail.clear();
        self.pending_frames.clear();
    }

    /// Whether the framer is still waiting for the envelope terminator.
    pub fn awaiting_handshake(&self) -> bool {
        self.handshake.is_some()
    }

    /// Bytes accumulated so far during the opening exchange.
    pub fn buffered(&self) -> &[u8] {
        self.handshake.as_deref().unwrap_or(&[])
    }

    /// Feed one chunk of socket data.
    ///
    /// Produces zero or more frames, retrieved with [`StreamFramer::poll_frame`].
    /// An error means the chunk could not be parsed; the connection is not
    /// usable afterwards.
    pub fn handle_input(&mut self, chunk: &[u8]) -> Result<()> {
        if let Some(buf) = self.handshake.as_mut() {
            buf.extend_from_slice(chunk);
            // earlier bytes were already scanned; only a tag ending in this
            // chunk can be new
            let from = buf
                .len()
                .saturating_sub(chunk.len() + STREAM_CLOSE.len() - 1);
            if !contains(&buf[from..], STREAM_CLOSE.as_bytes()) {
                return Ok(());
            }

            let buf = self.handshake.take().unwrap_or_default();
            let text = String::from_utf8(buf)
                .map_err(|_| ErrorKind::Xml("stream opening is not valid UTF-8".into()))?;
            let raw = strip_xml_declaration(&text);
            let document = parse_wrapped(&self.wrapper, &raw)?;
            self.pending_frames
                .push_back(Frame::Handshake { document, raw });
            return Ok(());
        }

        let text = self.decode(chunk)?;
        let (raw, ended) = match text.find(STREAM_CLOSE) {
            Some(pos) => {
                let mut body = String::with_capacity(text.len());
                body.push_str(&text[..pos]);
                body.push_str(&text[pos + STREAM_CLOSE.len()..]);
                (body, true)
            }
            None => (text, false),
        };

        // whitespace keepalives carry no stanza
        if !raw.trim().is_empty() {
            let document = parse_wrapped(&self.wrapper, &raw)?;
            self.pending_frames
                .push_back(Frame::Stanzas { document, raw });
        }
        if ended {
            self.pending_frames.push_back(Frame::StreamEnd);
        }
        Ok(())
    }

    /// Next parsed frame, in the order the bytes completed.
    pub fn poll_frame(&mut self) -> Option<Frame> {
        self.pending_frames.pop_front()
    }

    fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(e) => {
                let err = e.utf8_error();
                if err.error_len().is_some() {
                    return Err(ErrorKind::Xml("invalid UTF-8 in stream".into()));
                }
                let mut bytes = e.into_bytes();
                self.utf8_tail = bytes.split_off(err.valid_up_to());
                String::from_utf8(bytes)
                    .map_err(|_| ErrorKind::Xml("invalid UTF-8 in stream".into()))
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
