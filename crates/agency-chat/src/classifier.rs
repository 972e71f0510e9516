//! Keyword intent classifier.
//!
//! Maps an utterance to an [`Intent`] by walking an ordered table of trigger
//! phrases. The first rule whose phrase occurs in the normalized utterance
//! wins, so rule order encodes priority.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Intent;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// A trigger phrase and the intent it selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Lowercase phrase matched as a substring of the normalized utterance.
    pub phrase: &'static str,
    pub intent: Intent,
}

const fn rule(phrase: &'static str, intent: Intent) -> Rule {
    Rule { phrase, intent }
}

/// Default trigger table, highest priority first.
///
/// Client search comes before every other rule: "search for client X" also
/// contains generic client wording and must never fall through to a count.
/// Within client search, longer phrases precede their prefixes so the search
/// term is cut after the longest match.
pub const DEFAULT_RULES: &[Rule] = &[
    rule("search for clients", Intent::ClientSearch),
    rule("search for client", Intent::ClientSearch),
    rule("find clients", Intent::ClientSearch),
    rule("find client", Intent::ClientSearch),
    rule("search another client", Intent::ClientSearch),
    rule("new orders", Intent::NewOrders),
    rule("orders", Intent::NewOrders),
    rule("how many clients", Intent::ClientCount),
    rule("client count", Intent::ClientCount),
    rule("client stats", Intent::ClientCount),
    rule("client list", Intent::ClientCount),
    rule("clients", Intent::ClientCount),
    rule("active campaigns", Intent::ActiveCampaigns),
    rule("campaigns", Intent::ActiveCampaigns),
    rule("campaign", Intent::ActiveCampaigns),
    rule("available services", Intent::ServicesList),
    rule("services", Intent::ServicesList),
    rule("service", Intent::ServicesList),
    rule("help", Intent::Help),
    rule("what can you do", Intent::Help),
];

/// Stateless, rule-ordered intent classifier.
#[derive(Clone, Debug)]
pub struct IntentClassifier {
    rules: Vec<Rule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl IntentClassifier {
    /// Create a classifier over `rules`, evaluated in the given order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify an utterance.
    ///
    /// Returns `None` for empty or whitespace-only input, which callers treat
    /// as a no-op. Anything else classifies, falling back to `Unknown`.
    pub fn classify(&self, utterance: &str) -> Option<Intent> {
        let normalized = normalize(utterance);
        if normalized.is_empty() {
            return None;
        }
        let intent = self
            .rules
            .iter()
            .find(|r| normalized.contains(r.phrase))
            .map(|r| r.intent)
            .unwrap_or(Intent::Unknown);
        Some(intent)
    }

    /// Extract the client name from a search utterance.
    ///
    /// Everything up to and including the first client-search phrase is cut
    /// off; the rest keeps its original case and is trimmed. Returns the whole
    /// trimmed utterance when no search phrase is present.
    pub fn search_term(&self, utterance: &str) -> String {
        let collapsed = WHITESPACE_RE.replace_all(utterance.trim(), " ");
        let term = self
            .rules
            .iter()
            .filter(|r| r.intent == Intent::ClientSearch)
            .find_map(|r| {
                find_ignore_ascii_case(&collapsed, r.phrase)
                    .map(|pos| collapsed[pos + r.phrase.len()..].trim().to_string())
            });
        term.unwrap_or_else(|| collapsed.into_owned())
    }
}

/// Trim, collapse internal whitespace and case-fold.
pub fn normalize(utterance: &str) -> String {
    WHITESPACE_RE
        .replace_all(utterance.trim(), " ")
        .to_lowercase()
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.char_indices().map(|(i, _)| i).find(|&i| {
        haystack
            .get(i..i + needle.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    })
}
