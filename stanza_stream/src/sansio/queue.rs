//! Outbound queue of units waiting for the next flush.

use super::types::Outgoing;

#[derive(Debug, Default)]
pub struct OutputQueue {
    entries: Vec<Outgoing>,
    paused: bool,
}

impl OutputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit or restart sentinel to the tail.
    pub fn enqueue<O: Into<Outgoing>>(&mut self, entry: O) {
        self.entries.push(entry.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether a flush would write anything.
    pub fn is_ready(&self) -> bool {
        !self.paused && !self.entries.is_empty()
    }

    /// Take every entry queued so far, leaving the queue empty. Entries
    /// enqueued afterwards belong to the next flush.
    pub fn take(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.entries)
    }

    /// Drop all entries; the paused flag is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Element;

    #[test]
    fn test_fifo_take() {
        let mut queue = OutputQueue::new();
        queue.enqueue(Element::new("a"));
        queue.enqueue(Outgoing::Restart);
        queue.enqueue(Element::new("b"));
        assert_eq!(queue.len(), 3);

        let taken = queue.take();
        assert_eq!(
            taken,
            vec![
                Outgoing::Stanza(Element::new("a")),
                Outgoing::Restart,
                Outgoing::Stanza(Element::new("b")),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_paused_is_not_ready() {
        let mut queue = OutputQueue::new();
        assert!(!queue.is_ready());
        queue.enqueue(Element::new("a"));
        assert!(queue.is_ready());
        queue.set_paused(true);
        assert!(!queue.is_ready());
        queue.clear();
        assert!(queue.is_paused());
        assert!(queue.is_empty());
    }
}
