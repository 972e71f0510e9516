//! End-to-end dialogue tests against a seeded in-memory SQLite store.

use std::sync::Arc;

use agency_chat::composer::{GENERIC_SUGGESTIONS, WELCOME};
use agency_chat::{
    DialogueSession, Intent, NoDelay, RecordingView, ResponseComposer, Sender, SessionHandle,
    SessionSettings,
};
use agency_core::config::ChatConfig;
use agency_storage::{seed_demo_data, Collection, DataSource, Query, SqliteSource};

// =============================================================================
// Helpers
// =============================================================================

async fn seeded_source() -> Arc<SqliteSource> {
    let source = SqliteSource::in_memory().unwrap();
    seed_demo_data(&source).await.unwrap();
    Arc::new(source)
}

fn make_session(source: Arc<SqliteSource>) -> (DialogueSession, Arc<RecordingView>) {
    let config = ChatConfig::default();
    let composer = Arc::new(ResponseComposer::new(source, &config));
    let view = Arc::new(RecordingView::new());
    let session = DialogueSession::new(
        composer,
        view.clone(),
        Arc::new(NoDelay),
        SessionSettings::from(&config),
    );
    (session, view)
}

/// Submit one utterance and return the bot's reply text.
async fn ask(session: &mut DialogueSession, text: &str) -> String {
    session.submit(text).await.unwrap();
    let last = session.transcript().last().unwrap();
    assert_eq!(last.sender, Sender::Bot);
    last.text.clone()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_new_orders_lists_pending_newest_first() {
    let (mut session, _) = make_session(seeded_source().await);
    let reply = ask(&mut session, "show new orders").await;

    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines[0], "You have 2 new orders:");
    assert!(lines[1].starts_with("1. Order #"));
    assert!(lines[1].ends_with("\"Logo Design\" for \"Sara Adel\""));
    assert!(lines[2].ends_with("\"Social Media Management\" for \"Ahmed Hassan\""));
}

#[tokio::test]
async fn test_client_count_and_lists() {
    let (mut session, _) = make_session(seeded_source().await);

    assert_eq!(
        ask(&mut session, "How many clients?").await,
        "Total registered clients: 3. 👥"
    );

    let campaigns = ask(&mut session, "active campaigns summary").await;
    assert!(campaigns.starts_with("There are 2 active campaigns:"));
    assert!(campaigns.contains("Autumn Collection Launch: on Instagram with a budget of 12000.00 EGP"));
    assert!(!campaigns.contains("Search Leads Q4"));

    let services = ask(&mut session, "show available services").await;
    assert!(services.starts_with("Available services (4):"));
    assert!(services.contains("Logo Design: 1500.00 EGP"));
}

#[tokio::test]
async fn test_client_search() {
    let (mut session, view) = make_session(seeded_source().await);

    let found = ask(&mut session, "search for client ahmed").await;
    assert_eq!(
        found,
        "Client found:\nName: Ahmed Hassan\nEmail: ahmed.hassan@example.com\nPhone: +20 100 123 4567"
    );

    let no_phone = ask(&mut session, "find client Sara").await;
    assert!(no_phone.ends_with("Phone: Not specified"));

    let missing = ask(&mut session, "search for client Mona").await;
    assert_eq!(missing, "No client named \"Mona\" was found. 🔍");
    assert_eq!(
        view.last_suggestions().unwrap(),
        GENERIC_SUGGESTIONS
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_empty_store() {
    let source = Arc::new(SqliteSource::in_memory().unwrap());
    let (mut session, _) = make_session(source);
    assert_eq!(
        ask(&mut session, "new orders").await,
        agency_chat::composer::NO_NEW_ORDERS
    );
    assert_eq!(
        ask(&mut session, "client count").await,
        "Total registered clients: 0. 👥"
    );
}

#[tokio::test]
async fn test_chat_leaves_records_untouched() {
    let source = seeded_source().await;
    let before = source.count(&Query::new(Collection::Orders)).await.unwrap();

    let (session, _) = make_session(source.clone());
    let handle = SessionHandle::spawn(session);
    for text in ["new orders", "clients", "campaigns", "services", "help", "search for client Youssef"] {
        handle.submit(text).unwrap();
    }
    let session = handle.shutdown().await.unwrap();

    assert_eq!(session.transcript().len(), 13);
    assert_eq!(session.transcript()[0].text, WELCOME);
    assert_eq!(
        source.count(&Query::new(Collection::Orders)).await.unwrap(),
        before
    );
}

#[tokio::test]
async fn test_suggestions_are_resubmittable() {
    let (mut session, view) = make_session(seeded_source().await);
    session.start().await;
    let startup = view.last_suggestions().unwrap();

    let mut intents = Vec::new();
    for label in &startup {
        intents.push(session.submit(label).await.unwrap());
    }
    assert_eq!(
        intents,
        vec![
            Intent::NewOrders,
            Intent::ClientCount,
            Intent::ActiveCampaigns,
            Intent::ServicesList,
        ]
    );
}
