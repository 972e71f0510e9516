//! Chat assistant for the agency dashboard.
//!
//! Classifies operator utterances into a fixed set of intents, answers them
//! with read-only queries through the data access boundary, and sequences the
//! turns of a dialogue session.

pub mod classifier;
pub mod composer;
pub mod delay;
pub mod error;
pub mod session;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{IntentClassifier, Rule};
pub use composer::ResponseComposer;
pub use delay::{NoDelay, ReplyDelay, TokioDelay};
pub use error::ChatError;
pub use session::{DialogueSession, SessionHandle, SessionSettings};
pub use types::{DialogueTurn, Intent, Reply, Sender};
pub use view::{ChatView, RecordingView, ViewEvent};
