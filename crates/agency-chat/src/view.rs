//! Display boundary: where the session renders turns and suggestions.

use std::sync::Mutex;

use crate::types::{DialogueTurn, Sender};

/// Receives everything a session shows to the operator.
///
/// Suggestion labels are resubmittable verbatim as if typed.
pub trait ChatView: Send + Sync {
    fn append_turn(&self, turn: &DialogueTurn);
    fn show_typing(&self);
    fn hide_typing(&self);
    fn show_suggestions(&self, suggestions: &[String]);
}

/// A rendered event, as captured by [`RecordingView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    Turn(Sender, String),
    TypingShown,
    TypingHidden,
    Suggestions(Vec<String>),
}

/// Records every call in order. Used by tests and headless callers.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Text of every rendered turn from `sender`.
    pub fn turns_from(&self, sender: Sender) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Turn(s, text) if s == sender => Some(text),
                _ => None,
            })
            .collect()
    }

    /// The most recently rendered suggestion set.
    pub fn last_suggestions(&self) -> Option<Vec<String>> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Suggestions(s) => Some(s),
            _ => None,
        })
    }

    fn push(&self, event: ViewEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ChatView for RecordingView {
    fn append_turn(&self, turn: &DialogueTurn) {
        self.push(ViewEvent::Turn(turn.sender, turn.text.clone()));
    }

    fn show_typing(&self) {
        self.push(ViewEvent::TypingShown);
    }

    fn hide_typing(&self) {
        self.push(ViewEvent::TypingHidden);
    }

    fn show_suggestions(&self, suggestions: &[String]) {
        self.push(ViewEvent::Suggestions(suggestions.to_vec()));
    }
}
