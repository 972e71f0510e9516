use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle of a client order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Newly placed, not yet picked up.
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// Lifecycle of an advertising campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Active,
    Completed,
    Paused,
    Cancelled,
}

/// Kind of account stored in the `users` collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Client,
    Admin,
    Staff,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Active => "active",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// A customer of the agency (`users` row with `role = client`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An order for a service placed by a client.
///
/// `client` and `service` are only populated when the order was fetched with
/// the `users` / `services` relations embedded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "users", default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientRef>,
    #[serde(rename = "services", default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRef>,
}

impl Order {
    /// First eight characters of the identifier, as shown to operators.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client.as_ref().and_then(|c| c.name.as_deref())
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service.as_ref().and_then(|s| s.service_name.as_deref())
    }
}

/// Embedded projection of the client behind an order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Embedded projection of the service behind an order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRef {
    #[serde(default)]
    pub service_name: Option<String>,
}

/// An advertising campaign run on a platform (Facebook, Instagram, Google Ads...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub campaign_name: String,
    pub platform: String,
    pub budget: f64,
    pub status: CampaignStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A service offered by the agency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub service_name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

/// Format a decimal amount with two places and a currency label.
pub fn format_amount(amount: f64, currency: &str) -> String {
    if currency.is_empty() {
        format!("{:.2}", amount)
    } else {
        format!("{:.2} {}", amount, currency)
    }
}
