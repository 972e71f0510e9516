//! Dialogue session: owns the transcript and sequences each exchange.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use agency_core::config::ChatConfig;

use crate::composer::{
    ResponseComposer, GENERIC_FAILURE, GENERIC_SUGGESTIONS, STARTUP_SUGGESTIONS, WELCOME,
};
use crate::delay::ReplyDelay;
use crate::error::ChatError;
use crate::types::{DialogueTurn, Intent, Reply};
use crate::view::ChatView;

/// Timing of the artificial pauses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub welcome_delay: Duration,
    pub reply_delay: Duration,
}

impl From<&ChatConfig> for SessionSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            welcome_delay: config.welcome_delay(),
            reply_delay: config.reply_delay(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

// =============================================================================
// DialogueSession
// =============================================================================

/// A single operator's conversation with the assistant.
///
/// The transcript is append-only. Every non-blank submission adds exactly one
/// user turn followed by exactly one bot turn.
pub struct DialogueSession {
    id: Uuid,
    composer: Arc<ResponseComposer>,
    view: Arc<dyn ChatView>,
    delay: Arc<dyn ReplyDelay>,
    settings: SessionSettings,
    transcript: Vec<DialogueTurn>,
}

impl DialogueSession {
    pub fn new(
        composer: Arc<ResponseComposer>,
        view: Arc<dyn ChatView>,
        delay: Arc<dyn ReplyDelay>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            composer,
            view,
            delay,
            settings,
            transcript: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &[DialogueTurn] {
        &self.transcript
    }

    /// Greet the operator after the welcome delay and offer the startup
    /// suggestions.
    pub async fn start(&mut self) {
        info!(session_id = %self.id, "Starting dialogue session");
        self.delay.wait(self.settings.welcome_delay).await;
        self.append(DialogueTurn::bot(WELCOME));
        self.view.show_suggestions(&to_labels(STARTUP_SUGGESTIONS));
    }

    /// Process one utterance end to end.
    ///
    /// Blank input returns [`ChatError::EmptyMessage`] without touching the
    /// transcript. Anything else yields the classified intent; backend
    /// failures and a crashed composition both still produce a bot turn.
    pub async fn submit(&mut self, utterance: &str) -> Result<Intent, ChatError> {
        let Some(intent) = self.composer.classifier().classify(utterance) else {
            return Err(ChatError::EmptyMessage);
        };
        let utterance = utterance.trim().to_string();

        self.append(DialogueTurn::user(utterance.clone()));
        self.view.show_typing();
        debug!(session_id = %self.id, intent = intent.as_str(), "Classified utterance");

        let composer = Arc::clone(&self.composer);
        let task = tokio::spawn(async move { composer.compose(intent, &utterance).await });
        let reply = match task.await {
            Ok(reply) => reply,
            Err(err) => {
                error!(
                    session_id = %self.id,
                    intent = intent.as_str(),
                    error = %err,
                    "Reply composition failed"
                );
                Reply::new(GENERIC_FAILURE, GENERIC_SUGGESTIONS)
            }
        };

        self.delay.wait(self.settings.reply_delay).await;
        self.view.hide_typing();
        self.append(DialogueTurn::bot(reply.message));
        self.view.show_suggestions(&reply.suggestions);
        Ok(intent)
    }

    fn append(&mut self, turn: DialogueTurn) {
        self.view.append_turn(&turn);
        self.transcript.push(turn);
    }
}

fn to_labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// SessionHandle
// =============================================================================

/// Submissions a [`SessionHandle`] holds before refusing new ones.
pub const SUBMIT_QUEUE_CAPACITY: usize = 32;

/// Fire-and-forget front for a session running on its own task.
///
/// Submissions are queued and processed strictly in arrival order; each one
/// finishes (user turn and bot turn) before the next starts. The queue is
/// bounded so a stalled backend cannot make it grow without limit.
pub struct SessionHandle {
    tx: mpsc::Sender<String>,
    task: JoinHandle<DialogueSession>,
}

impl SessionHandle {
    /// Start `session` on a new task and begin accepting submissions.
    pub fn spawn(session: DialogueSession) -> Self {
        Self::with_capacity(session, SUBMIT_QUEUE_CAPACITY)
    }

    /// Like [`spawn`](Self::spawn) with room for `capacity` waiting
    /// submissions.
    pub fn with_capacity(mut session: DialogueSession, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
        let task = tokio::spawn(async move {
            session.start().await;
            while let Some(utterance) = rx.recv().await {
                if let Err(err) = session.submit(&utterance).await {
                    debug!(session_id = %session.id(), error = %err, "Submission ignored");
                }
            }
            info!(session_id = %session.id(), turns = session.transcript().len(), "Dialogue session ended");
            session
        });
        Self { tx, task }
    }

    /// Queue an utterance. Returns immediately, with
    /// [`ChatError::QueueFull`] when the queue has no room.
    pub fn submit(&self, utterance: impl Into<String>) -> Result<(), ChatError> {
        self.tx.try_send(utterance.into()).map_err(|err| match err {
            TrySendError::Full(_) => ChatError::QueueFull,
            TrySendError::Closed(_) => ChatError::SessionClosed,
        })
    }

    /// Stop accepting input, finish everything already queued and hand back
    /// the session.
    pub async fn shutdown(self) -> Result<DialogueSession, ChatError> {
        drop(self.tx);
        self.task.await.map_err(|err| {
            error!(error = %err, "Dialogue session task failed");
            ChatError::SessionClosed
        })
    }
}
