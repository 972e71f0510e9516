use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The purpose of an operator utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NewOrders,
    ClientCount,
    ActiveCampaigns,
    ServicesList,
    ClientSearch,
    Help,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::NewOrders => "new_orders",
            Intent::ClientCount => "client_count",
            Intent::ActiveCampaigns => "active_campaigns",
            Intent::ServicesList => "services_list",
            Intent::ClientSearch => "client_search",
            Intent::Help => "help",
            Intent::Unknown => "unknown",
        }
    }
}

/// Who authored a dialogue turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the session transcript. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub id: Uuid,
    pub sender: Sender,
    /// Reply text; list replies put one entry per line.
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl DialogueTurn {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}

/// A composed answer plus the follow-up suggestions to offer with it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Reply {
    pub fn new(message: impl Into<String>, suggestions: &[&str]) -> Self {
        Self {
            message: message.into(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_serde_matches_as_str() {
        for intent in [
            Intent::NewOrders,
            Intent::ClientCount,
            Intent::ActiveCampaigns,
            Intent::ServicesList,
            Intent::ClientSearch,
            Intent::Help,
            Intent::Unknown,
        ] {
            let json = serde_json::to_value(intent).unwrap();
            assert_eq!(json, serde_json::json!(intent.as_str()));
        }
    }

    #[test]
    fn test_turn_constructors() {
        let user = DialogueTurn::user("how many clients");
        let bot = DialogueTurn::bot("Total registered clients: 3.");
        assert_eq!(user.sender, Sender::User);
        assert_eq!(bot.sender, Sender::Bot);
        assert_ne!(user.id, bot.id);
        assert!(bot.created_at >= user.created_at);
    }

    #[test]
    fn test_reply_new() {
        let reply = Reply::new("hi", &["a", "b"]);
        assert_eq!(reply.message, "hi");
        assert_eq!(reply.suggestions, vec!["a", "b"]);
    }
}
