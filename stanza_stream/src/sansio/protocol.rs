//! Envelope-level helpers: building the opening tag and preparing chunk text
//! for parsing. No I/O happens here.

use crate::config::TransportConfig;
use crate::error::*;
use crate::Element;

/// Qualified name of the envelope element.
pub const STREAM_NAME: &str = "stream:stream";

/// The tag the remote side sends when it ends the envelope.
pub const STREAM_CLOSE: &str = "</stream:stream>";

/// Build the envelope-opening element for `domain`.
///
/// The element is meant to be written with [`Element::open_tag`]; it never
/// gets a matching close from this side until the stream ends.
///
/// ```
/// use stanza_stream::sansio::protocol::build_stream;
/// use stanza_stream::TransportConfig;
///
/// let open = build_stream(&TransportConfig::default(), "example.com");
/// assert_eq!(
///     open.open_tag(),
///     "<stream:stream xmlns='jabber:client' \
///      xmlns:stream='http://etherx.jabber.org/streams' version='1.0' to='example.com'>"
/// );
/// ```
pub fn build_stream(config: &TransportConfig, domain: &str) -> Element {
    Element::new(STREAM_NAME)
        .attr("xmlns", config.namespaces.client.as_str())
        .attr("xmlns:stream", config.namespaces.stream.as_str())
        .attr("version", config.version.as_str())
        .attr("to", domain)
}

/// Remove the first `<?xml ...?>` declaration from `text`.
///
/// The declaration is only valid at the very start of a document, so it has
/// to go before the text is wrapped in a synthetic root.
pub fn strip_xml_declaration(text: &str) -> String {
    if let Some(start) = text.find("<?xml") {
        if let Some(len) = text[start..].find("?>") {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..start]);
            out.push_str(&text[start + len + 2..]);
            return out;
        }
    }
    text.to_string()
}

/// Wrap `text` in a `<wrapper>` root so a sequence of sibling elements (or
/// an envelope together with its content) parses as one document.
pub fn parse_wrapped(wrapper: &str, text: &str) -> Result<Element> {
    let mut doc = String::with_capacity(text.len() + 2 * wrapper.len() + 5);
    doc.push('<');
    doc.push_str(wrapper);
    doc.push('>');
    doc.push_str(text);
    doc.push_str("</");
    doc.push_str(wrapper);
    doc.push('>');
    Element::parse(&doc)
}

/// Whether the first stanza of a parsed chunk is an unavailable presence.
pub fn is_unavailable_presence(document: &Element) -> bool {
    document
        .first_child()
        .map(|e| e.name() == "presence" && e.get_attr("type") == Some("unavailable"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_declaration() {
        assert_eq!(
            strip_xml_declaration("<?xml version='1.0'?><stream:stream>"),
            "<stream:stream>"
        );
        assert_eq!(
            strip_xml_declaration(" <?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a/>"),
            " \n<a/>"
        );
        assert_eq!(strip_xml_declaration("<a/>"), "<a/>");
    }

    #[test]
    fn test_parse_wrapped_siblings() {
        let doc = parse_wrapped("wrapper", "<message/><iq type='get'/>").unwrap();
        assert_eq!(doc.name(), "wrapper");
        let names: Vec<_> = doc.children().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["message", "iq"]);
    }

    #[test]
    fn test_parse_wrapped_rejects_open_envelope() {
        assert!(parse_wrapped("wrapper", "<stream:stream to='a'>").is_err());
    }

    #[test]
    fn test_unavailable_presence() {
        let doc = parse_wrapped("wrapper", "<presence type='unavailable'/>").unwrap();
        assert!(is_unavailable_presence(&doc));
        let doc = parse_wrapped("wrapper", "<presence/>").unwrap();
        assert!(!is_unavailable_presence(&doc));
        // only the first stanza of the chunk is looked at
        let doc = parse_wrapped("wrapper", "<message/><presence type='unavailable'/>").unwrap();
        assert!(!is_unavailable_presence(&doc));
    }
}
