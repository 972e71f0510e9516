//! Line-oriented terminal rendering of a chat session.

use std::io::Write;
use std::sync::Mutex;

use agency_chat::{ChatView, DialogueTurn, Sender};

const TYPING: &str = "assistant is typing...";

/// Prints turns to stdout and numbers the current suggestions so the
/// operator can answer with a digit.
#[derive(Debug, Default)]
pub struct TerminalView {
    suggestions: Mutex<Vec<String>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a typed line to the utterance to submit. A number selects the
    /// matching suggestion from the last set shown; anything else passes
    /// through unchanged.
    pub fn resolve_input(&self, line: &str) -> String {
        let line = line.trim();
        let picked = line.parse::<usize>().ok().and_then(|n| {
            let index = n.checked_sub(1)?;
            let suggestions = self.suggestions.lock().ok()?;
            suggestions.get(index).cloned()
        });
        picked.unwrap_or_else(|| line.to_string())
    }
}

fn label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    }
}

impl ChatView for TerminalView {
    fn append_turn(&self, turn: &DialogueTurn) {
        // User input is already on screen.
        if turn.sender == Sender::User {
            return;
        }
        let mut out = std::io::stdout().lock();
        for (i, line) in turn.text.lines().enumerate() {
            let prefix = if i == 0 { label(turn.sender) } else { "" };
            let _ = writeln!(out, "{:>3}> {}", prefix, line);
        }
    }

    fn show_typing(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "{}", TYPING);
        let _ = out.flush();
    }

    fn hide_typing(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}\r", " ".repeat(TYPING.len()));
        let _ = out.flush();
    }

    fn show_suggestions(&self, suggestions: &[String]) {
        let mut out = std::io::stdout().lock();
        for (i, s) in suggestions.iter().enumerate() {
            let _ = writeln!(out, "     [{}] {}", i + 1, s);
        }
        let _ = out.flush();
        if let Ok(mut current) = self.suggestions.lock() {
            *current = suggestions.to_vec();
        }
    }
}
