//! The marker deck: a LIFO of (id, cursor hint, grab?) records whose top
//! entry defines the root cursor and optional pointer grab (spec §3, §6).

use crate::hooks::{CursorHint, MarkerSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    id: u64,
    hint: CursorHint,
    grab: bool,
}

/// Tracks the deck and forwards top-of-deck changes to a [`MarkerSink`].
/// Core never reads the sink back; it is a push-only notification channel.
#[derive(Debug, Default)]
pub struct MarkerDeck {
    stack: Vec<Marker>,
}

impl MarkerDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new marker for `id`, notifying `sink`.
    pub fn push(&mut self, sink: &mut dyn MarkerSink, id: u64, hint: CursorHint, grab: bool) {
        self.stack.push(Marker { id, hint, grab });
        sink.push(id, hint, grab);
    }

    /// Remove the marker previously pushed for `id` (may not be on top).
    pub fn remove(&mut self, sink: &mut dyn MarkerSink, id: u64) {
        self.stack.retain(|m| m.id != id);
        sink.pop(id);
    }

    /// The current top-of-deck hint, if any.
    pub fn top(&self) -> Option<CursorHint> {
        self.stack.last().map(|m| m.hint)
    }

    /// Whether the top-of-deck marker asks for a pointer grab.
    pub fn top_wants_grab(&self) -> bool {
        self.stack.last().map(|m| m.grab).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        pushed: Vec<(u64, CursorHint, bool)>,
        popped: Vec<u64>,
    }

    impl MarkerSink for RecordingSink {
        fn push(&mut self, id: u64, hint: CursorHint, grab: bool) {
            self.pushed.push((id, hint, grab));
        }
        fn pop(&mut self, id: u64) {
            self.popped.push(id);
        }
    }

    #[test]
    fn top_of_deck_wins() {
        let mut deck = MarkerDeck::new();
        let mut sink = RecordingSink::default();
        deck.push(&mut sink, 1, CursorHint::HoverFrame, false);
        deck.push(&mut sink, 2, CursorHint::Dragging, true);
        assert_eq!(deck.top(), Some(CursorHint::Dragging));
        assert!(deck.top_wants_grab());

        deck.remove(&mut sink, 2);
        assert_eq!(deck.top(), Some(CursorHint::HoverFrame));
        assert!(!deck.top_wants_grab());
        assert_eq!(sink.popped, vec![2]);
    }

    #[test]
    fn empty_deck_has_no_top() {
        let deck = MarkerDeck::new();
        assert_eq!(deck.top(), None);
        assert!(!deck.top_wants_grab());
    }
}
