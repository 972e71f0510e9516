//! Response composition for classified intents.
//!
//! Each intent maps to at most one read-only query through the
//! [`DataSource`]. Backend and decode failures never escape: they degrade to
//! a fixed per-intent message so the dialogue always gets a reply.

use std::sync::Arc;

use tracing::{debug, warn};

use agency_core::config::ChatConfig;
use agency_core::types::{
    format_amount, Campaign, CampaignStatus, Client, Order, OrderStatus, Service, UserRole,
};
use agency_storage::{decode_records, Collection, DataSource, Query};

use crate::classifier::IntentClassifier;
use crate::error::ChatError;
use crate::types::{Intent, Reply};

// =============================================================================
// Messages
// =============================================================================

pub const WELCOME: &str = "Hello! I'm your agency assistant. \
Ask me about new orders, clients, campaigns or services, or pick a suggestion below.";

pub const NO_NEW_ORDERS: &str = "There are no new orders right now. 🎉";
pub const NO_ACTIVE_CAMPAIGNS: &str = "There are no active campaigns right now. 📊";
pub const NO_SERVICES: &str = "No services are available right now.";
pub const SEARCH_USAGE: &str =
    "Type a client name after the command, for example: search for client Ahmed";

pub const HELP: &str = "I can help you with:\n\
- New orders: \"new orders\"\n\
- Client statistics: \"how many clients\"\n\
- Active campaigns: \"active campaigns\"\n\
- Available services: \"available services\"\n\
- Finding a client: \"search for client <name>\"\n\
Type a command or pick one of the suggestions below.";

pub const UNKNOWN: &str = "Sorry, I didn't understand that. Try one of the suggested commands.";

/// Shown when composing a reply failed outright.
pub const GENERIC_FAILURE: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

const NOT_SPECIFIED: &str = "Not specified";

// =============================================================================
// Suggestions
// =============================================================================

pub const STARTUP_SUGGESTIONS: &[&str] = &[
    "show new orders",
    "how many clients?",
    "active campaigns summary",
    "show available services",
];

/// Offered with unknown input, errors and empty results.
pub const GENERIC_SUGGESTIONS: &[&str] = &[
    "show new orders",
    "how many clients?",
    "active campaigns summary",
];

const HELP_SUGGESTIONS: &[&str] = &[
    "show new orders",
    "how many clients?",
    "active campaigns",
    "available services",
];

const ORDER_SUGGESTIONS: &[&str] = &["show all orders", "client stats", "active campaigns"];
const CLIENT_COUNT_SUGGESTIONS: &[&str] = &["show client list", "add new client", "new orders"];
const CAMPAIGN_SUGGESTIONS: &[&str] = &[
    "show all campaigns",
    "create new campaign",
    "campaign reports",
];
const SERVICE_SUGGESTIONS: &[&str] = &["show all services", "add new service", "edit prices"];
const SEARCH_SUGGESTIONS: &[&str] = &[
    "this client's orders",
    "edit client data",
    "search another client",
];

/// Fixed reply text when the backend call behind `intent` fails.
pub fn error_message(intent: Intent) -> &'static str {
    match intent {
        Intent::NewOrders => "Something went wrong while fetching orders.",
        Intent::ClientCount => "Something went wrong while counting clients.",
        Intent::ActiveCampaigns => "Something went wrong while fetching campaigns.",
        Intent::ServicesList => "Something went wrong while fetching services.",
        Intent::ClientSearch => "Something went wrong while searching for the client.",
        Intent::Help | Intent::Unknown => GENERIC_FAILURE,
    }
}

// =============================================================================
// ResponseComposer
// =============================================================================

/// Builds replies for classified intents.
pub struct ResponseComposer {
    source: Arc<dyn DataSource>,
    classifier: IntentClassifier,
    max_results: usize,
    currency: String,
}

impl ResponseComposer {
    pub fn new(source: Arc<dyn DataSource>, config: &ChatConfig) -> Self {
        Self {
            source,
            classifier: IntentClassifier::default(),
            max_results: config.max_results,
            currency: config.currency.clone(),
        }
    }

    /// Replace the classifier used for search-term extraction and by sessions.
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Compose the reply for `intent`. Never fails.
    pub async fn compose(&self, intent: Intent, utterance: &str) -> Reply {
        let result = match intent {
            Intent::NewOrders => self.new_orders().await,
            Intent::ClientCount => self.client_count().await,
            Intent::ActiveCampaigns => self.active_campaigns().await,
            Intent::ServicesList => self.services().await,
            Intent::ClientSearch => self.client_search(utterance).await,
            Intent::Help => Ok(Reply::new(HELP, HELP_SUGGESTIONS)),
            Intent::Unknown => Ok(Reply::new(UNKNOWN, GENERIC_SUGGESTIONS)),
        };
        result.unwrap_or_else(|err| degraded(intent, err))
    }

    async fn new_orders(&self) -> Result<Reply, ChatError> {
        let query = Query::new(Collection::Orders)
            .select(&["id", "status", "created_at"])
            .eq("status", OrderStatus::Pending.as_str())
            .order_by("created_at", true)
            .limit(self.max_results)
            .embed(Collection::Users, &["name"])
            .embed(Collection::Services, &["service_name"]);
        let orders: Vec<Order> = decode_records(self.source.fetch(&query).await?)?;
        debug!(count = orders.len(), "Fetched pending orders");

        if orders.is_empty() {
            return Ok(Reply::new(NO_NEW_ORDERS, GENERIC_SUGGESTIONS));
        }

        let mut message = match orders.len() {
            1 => "You have 1 new order:".to_string(),
            n => format!("You have {} new orders:", n),
        };
        for (i, order) in orders.iter().enumerate() {
            message.push_str(&format!(
                "\n{}. Order #{}: \"{}\" for \"{}\"",
                i + 1,
                order.short_id(),
                order.service_name().unwrap_or(NOT_SPECIFIED),
                order.client_name().unwrap_or(NOT_SPECIFIED),
            ));
        }
        Ok(Reply::new(message, ORDER_SUGGESTIONS))
    }

    async fn client_count(&self) -> Result<Reply, ChatError> {
        let query = Query::new(Collection::Users).eq("role", UserRole::Client.as_str());
        let count = self.source.count(&query).await?;
        debug!(count, "Counted clients");
        Ok(Reply::new(
            format!("Total registered clients: {}. 👥", count),
            CLIENT_COUNT_SUGGESTIONS,
        ))
    }

    async fn active_campaigns(&self) -> Result<Reply, ChatError> {
        let query = Query::new(Collection::Campaigns)
            .select(&["id", "campaign_name", "platform", "budget", "status"])
            .eq("status", CampaignStatus::Active.as_str())
            .limit(self.max_results);
        let campaigns: Vec<Campaign> = decode_records(self.source.fetch(&query).await?)?;
        debug!(count = campaigns.len(), "Fetched active campaigns");

        if campaigns.is_empty() {
            return Ok(Reply::new(NO_ACTIVE_CAMPAIGNS, GENERIC_SUGGESTIONS));
        }

        let mut message = match campaigns.len() {
            1 => "There is 1 active campaign:".to_string(),
            n => format!("There are {} active campaigns:", n),
        };
        for (i, campaign) in campaigns.iter().enumerate() {
            message.push_str(&format!(
                "\n{}. {}: on {} with a budget of {}",
                i + 1,
                campaign.campaign_name,
                campaign.platform,
                format_amount(campaign.budget, &self.currency),
            ));
        }
        Ok(Reply::new(message, CAMPAIGN_SUGGESTIONS))
    }

    async fn services(&self) -> Result<Reply, ChatError> {
        let query = Query::new(Collection::Services)
            .select(&["id", "service_name", "price", "description"])
            .limit(self.max_results);
        let services: Vec<Service> = decode_records(self.source.fetch(&query).await?)?;
        debug!(count = services.len(), "Fetched services");

        if services.is_empty() {
            return Ok(Reply::new(NO_SERVICES, GENERIC_SUGGESTIONS));
        }

        let mut message = format!("Available services ({}):", services.len());
        for (i, service) in services.iter().enumerate() {
            message.push_str(&format!(
                "\n{}. {}: {}",
                i + 1,
                service.service_name,
                format_amount(service.price, &self.currency),
            ));
        }
        Ok(Reply::new(message, SERVICE_SUGGESTIONS))
    }

    async fn client_search(&self, utterance: &str) -> Result<Reply, ChatError> {
        let term = self.classifier.search_term(utterance);
        if term.is_empty() {
            return Ok(Reply::new(SEARCH_USAGE, GENERIC_SUGGESTIONS));
        }

        let query = Query::new(Collection::Users)
            .ilike("name", &term)
            .eq("role", UserRole::Client.as_str())
            .limit(1);
        let clients: Vec<Client> = decode_records(self.source.fetch(&query).await?)?;
        debug!(term = %term, found = !clients.is_empty(), "Searched clients");

        let Some(client) = clients.first() else {
            return Ok(Reply::new(
                format!("No client named \"{}\" was found. 🔍", term),
                GENERIC_SUGGESTIONS,
            ));
        };

        let message = format!(
            "Client found:\nName: {}\nEmail: {}\nPhone: {}",
            client.name,
            client.email,
            client.phone_number.as_deref().unwrap_or(NOT_SPECIFIED),
        );
        Ok(Reply::new(message, SEARCH_SUGGESTIONS))
    }
}

fn degraded(intent: Intent, err: ChatError) -> Reply {
    warn!(intent = intent.as_str(), error = %err, "Backend call failed, sending fixed reply");
    Reply::new(error_message(intent), GENERIC_SUGGESTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_storage::query::Filter;
    use serde_json::json;

    use crate::testing::FakeSource;

    fn make_composer(source: FakeSource) -> (ResponseComposer, Arc<FakeSource>) {
        let source = Arc::new(source);
        let composer = ResponseComposer::new(source.clone(), &ChatConfig::default());
        (composer, source)
    }

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ---- new_orders ----

    #[tokio::test]
    async fn test_no_new_orders_is_exact_literal() {
        let (composer, _) = make_composer(FakeSource::empty());
        let reply = composer.compose(Intent::NewOrders, "show new orders").await;
        assert_eq!(reply.message, NO_NEW_ORDERS);
        assert!(!reply.message.contains("1."));
        assert_eq!(reply.suggestions, strs(GENERIC_SUGGESTIONS));
    }

    #[tokio::test]
    async fn test_new_orders_list() {
        let (composer, source) = make_composer(FakeSource::with_rows(vec![
            json!({
                "id": "0f9c2d1e-aaaa-bbbb-cccc-000000000001",
                "status": "pending",
                "created_at": "2026-10-15T08:40:00.000Z",
                "users": { "name": "Sara Adel" },
                "services": { "service_name": "Logo Design" },
            }),
            json!({
                "id": "77aa00bb-aaaa-bbbb-cccc-000000000002",
                "status": "pending",
                "users": null,
                "services": { "service_name": null },
            }),
        ]));
        let reply = composer.compose(Intent::NewOrders, "new orders").await;
        assert_eq!(
            reply.message,
            "You have 2 new orders:\n\
             1. Order #0f9c2d1e: \"Logo Design\" for \"Sara Adel\"\n\
             2. Order #77aa00bb: \"Not specified\" for \"Not specified\""
        );
        assert_eq!(reply.suggestions, strs(ORDER_SUGGESTIONS));

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        let query = &queries[0];
        assert_eq!(query.collection, Collection::Orders);
        assert_eq!(query.limit, Some(5));
        assert_eq!(
            query.filters,
            vec![Filter::Eq {
                field: "status".into(),
                value: json!("pending"),
            }]
        );
        let order = query.order.as_ref().unwrap();
        assert_eq!(order.field, "created_at");
        assert!(order.descending);
        assert_eq!(query.embeds.len(), 2);
    }

    #[tokio::test]
    async fn test_single_order_is_singular() {
        let (composer, _) = make_composer(FakeSource::with_rows(vec![json!({
            "id": "abcdef12-0000",
            "status": "pending",
            "users": { "name": "Ahmed Hassan" },
            "services": { "service_name": "SEO Audit" },
        })]));
        let reply = composer.compose(Intent::NewOrders, "new orders").await;
        assert_eq!(
            reply.message,
            "You have 1 new order:\n1. Order #abcdef12: \"SEO Audit\" for \"Ahmed Hassan\""
        );
    }

    #[tokio::test]
    async fn test_max_results_follows_config() {
        let source = Arc::new(FakeSource::empty());
        let config = ChatConfig {
            max_results: 3,
            ..ChatConfig::default()
        };
        let composer = ResponseComposer::new(source.clone(), &config);
        composer.compose(Intent::ServicesList, "services").await;
        assert_eq!(source.queries()[0].limit, Some(3));
    }

    // ---- client_count ----

    #[tokio::test]
    async fn test_zero_clients_renders_zero() {
        let (composer, source) = make_composer(FakeSource::with_count(0));
        let reply = composer.compose(Intent::ClientCount, "how many clients").await;
        assert_eq!(reply.message, "Total registered clients: 0. 👥");
        assert_eq!(reply.suggestions, strs(CLIENT_COUNT_SUGGESTIONS));
        assert_eq!(
            source.queries()[0].filters,
            vec![Filter::Eq {
                field: "role".into(),
                value: json!("client"),
            }]
        );
    }

    #[tokio::test]
    async fn test_client_count() {
        let (composer, _) = make_composer(FakeSource::with_count(42));
        let reply = composer.compose(Intent::ClientCount, "clients").await;
        assert!(reply.message.contains("42"));
    }

    // ---- active_campaigns ----

    #[tokio::test]
    async fn test_active_campaigns_formats_budget() {
        let (composer, _) = make_composer(FakeSource::with_rows(vec![json!({
            "id": "c1",
            "campaign_name": "Autumn Launch",
            "platform": "Instagram",
            "budget": 12000,
            "status": "active",
        })]));
        let reply = composer.compose(Intent::ActiveCampaigns, "active campaigns").await;
        assert_eq!(
            reply.message,
            "There is 1 active campaign:\n1. Autumn Launch: on Instagram with a budget of 12000.00 EGP"
        );
        assert_eq!(reply.suggestions, strs(CAMPAIGN_SUGGESTIONS));
    }

    #[tokio::test]
    async fn test_no_active_campaigns() {
        let (composer, _) = make_composer(FakeSource::empty());
        let reply = composer.compose(Intent::ActiveCampaigns, "campaigns").await;
        assert_eq!(reply.message, NO_ACTIVE_CAMPAIGNS);
        assert_eq!(reply.suggestions, strs(GENERIC_SUGGESTIONS));
    }

    // ---- services_list ----

    #[tokio::test]
    async fn test_services_list_uses_currency() {
        let source = Arc::new(FakeSource::with_rows(vec![
            json!({ "id": "s1", "service_name": "Logo Design", "price": 1500.5 }),
            json!({ "id": "s2", "service_name": "SEO Audit", "price": 1800 }),
        ]));
        let config = ChatConfig {
            currency: "USD".into(),
            ..ChatConfig::default()
        };
        let composer = ResponseComposer::new(source, &config);
        let reply = composer.compose(Intent::ServicesList, "services").await;
        assert_eq!(
            reply.message,
            "Available services (2):\n1. Logo Design: 1500.50 USD\n2. SEO Audit: 1800.00 USD"
        );
        assert_eq!(reply.suggestions, strs(SERVICE_SUGGESTIONS));
    }

    // ---- client_search ----

    #[tokio::test]
    async fn test_search_uses_exact_term() {
        let (composer, source) = make_composer(FakeSource::empty());
        composer
            .compose(Intent::ClientSearch, "search for client Ahmed")
            .await;
        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].collection, Collection::Users);
        assert_eq!(queries[0].limit, Some(1));
        assert!(queries[0].filters.contains(&Filter::ILike {
            field: "name".into(),
            term: "Ahmed".into(),
        }));
        assert!(queries[0].filters.contains(&Filter::Eq {
            field: "role".into(),
            value: json!("client"),
        }));
    }

    #[tokio::test]
    async fn test_search_not_found_names_term() {
        let (composer, _) = make_composer(FakeSource::empty());
        let reply = composer
            .compose(Intent::ClientSearch, "Search for client Mona Zaki")
            .await;
        assert_eq!(reply.message, "No client named \"Mona Zaki\" was found. 🔍");
        assert_eq!(reply.suggestions, strs(GENERIC_SUGGESTIONS));
    }

    #[tokio::test]
    async fn test_search_found_without_phone() {
        let (composer, _) = make_composer(FakeSource::with_rows(vec![json!({
            "id": "u1",
            "name": "Sara Adel",
            "email": "sara@example.com",
            "phone_number": null,
            "role": "client",
        })]));
        let reply = composer
            .compose(Intent::ClientSearch, "search for client sara")
            .await;
        assert_eq!(
            reply.message,
            "Client found:\nName: Sara Adel\nEmail: sara@example.com\nPhone: Not specified"
        );
        assert_eq!(reply.suggestions, strs(SEARCH_SUGGESTIONS));
    }

    #[tokio::test]
    async fn test_empty_search_term_skips_backend() {
        let (composer, source) = make_composer(FakeSource::failing());
        let reply = composer
            .compose(Intent::ClientSearch, "search another client")
            .await;
        assert_eq!(reply.message, SEARCH_USAGE);
        assert!(source.queries().is_empty());
    }

    // ---- help / unknown ----

    #[tokio::test]
    async fn test_help_and_unknown_make_no_queries() {
        let (composer, source) = make_composer(FakeSource::failing());
        let help = composer.compose(Intent::Help, "help").await;
        assert_eq!(help.message, HELP);
        assert_eq!(help.suggestions, strs(HELP_SUGGESTIONS));

        let unknown = composer.compose(Intent::Unknown, "good morning").await;
        assert_eq!(unknown.message, UNKNOWN);
        assert_eq!(unknown.suggestions, strs(GENERIC_SUGGESTIONS));
        assert!(source.queries().is_empty());
    }

    #[test]
    fn test_help_suggestions_classify_to_primary_intents() {
        let classifier = IntentClassifier::default();
        let intents: Vec<Option<Intent>> = HELP_SUGGESTIONS
            .iter()
            .map(|s| classifier.classify(s))
            .collect();
        assert_eq!(
            intents,
            vec![
                Some(Intent::NewOrders),
                Some(Intent::ClientCount),
                Some(Intent::ActiveCampaigns),
                Some(Intent::ServicesList),
            ]
        );
    }

    // ---- failures ----

    #[tokio::test]
    async fn test_backend_failure_gives_fixed_error_per_intent() {
        for intent in [
            Intent::NewOrders,
            Intent::ClientCount,
            Intent::ActiveCampaigns,
            Intent::ServicesList,
            Intent::ClientSearch,
        ] {
            let (composer, _) = make_composer(FakeSource::failing());
            let reply = composer.compose(intent, "search for client Ahmed").await;
            assert_eq!(reply.message, error_message(intent), "{:?}", intent);
            assert!(!reply.message.contains("connection refused"));
            assert_eq!(reply.suggestions, strs(GENERIC_SUGGESTIONS));
        }
    }

    #[tokio::test]
    async fn test_undecodable_rows_degrade() {
        let (composer, _) = make_composer(FakeSource::with_rows(vec![json!({ "id": "x" })]));
        let reply = composer.compose(Intent::ActiveCampaigns, "campaigns").await;
        assert_eq!(reply.message, error_message(Intent::ActiveCampaigns));
    }

    #[tokio::test]
    async fn test_composer_never_mutates() {
        let (composer, source) = make_composer(FakeSource::with_count(1));
        for intent in [
            Intent::NewOrders,
            Intent::ClientCount,
            Intent::ActiveCampaigns,
            Intent::ServicesList,
            Intent::ClientSearch,
            Intent::Help,
            Intent::Unknown,
        ] {
            composer.compose(intent, "search for client Ahmed").await;
        }
        assert_eq!(source.mutations(), 0);
    }
}
