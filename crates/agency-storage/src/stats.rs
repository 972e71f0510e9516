//! Headline counters shown on the dashboard.

use serde::Serialize;
use tracing::warn;

use agency_core::error::Result;
use agency_core::types::{CampaignStatus, OrderStatus, UserRole};

use crate::collection::Collection;
use crate::query::Query;
use crate::source::DataSource;

/// The four dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub new_orders: u64,
    pub total_clients: u64,
    pub active_campaigns: u64,
    pub total_services: u64,
}

impl DashboardStats {
    /// Load all counters concurrently. A counter whose query fails is logged
    /// and reported as zero so one broken collection does not blank the rest.
    pub async fn load(source: &dyn DataSource) -> Self {
        let new_orders = Query::new(Collection::Orders).eq("status", OrderStatus::Pending.as_str());
        let clients = Query::new(Collection::Users).eq("role", UserRole::Client.as_str());
        let campaigns =
            Query::new(Collection::Campaigns).eq("status", CampaignStatus::Active.as_str());
        let services = Query::new(Collection::Services);

        let (orders, clients, campaigns, services) = tokio::join!(
            source.count(&new_orders),
            source.count(&clients),
            source.count(&campaigns),
            source.count(&services),
        );

        Self {
            new_orders: or_zero("new_orders", orders),
            total_clients: or_zero("total_clients", clients),
            active_campaigns: or_zero("active_campaigns", campaigns),
            total_services: or_zero("total_services", services),
        }
    }
}

fn or_zero(counter: &'static str, result: Result<u64>) -> u64 {
    result.unwrap_or_else(|e| {
        warn!(counter, error = %e, "Dashboard counter failed");
        0
    })
}
