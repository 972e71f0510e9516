//! Demo data for a fresh store.

use serde_json::json;
use tracing::info;

use agency_core::error::Result;

use crate::collection::Collection;
use crate::query::Query;
use crate::source::{record_from, DataSource};

/// Rows written by [`seed_demo_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub clients: u64,
    pub services: u64,
    pub orders: u64,
    pub campaigns: u64,
    /// The store already held users; nothing was written.
    pub skipped: bool,
}

/// Insert a small, consistent set of clients, services, orders and campaigns
/// through the data access boundary. Does nothing when any user exists.
pub async fn seed_demo_data(source: &dyn DataSource) -> Result<SeedSummary> {
    if source.count(&Query::new(Collection::Users)).await? > 0 {
        info!("Store already has users, skipping demo data");
        return Ok(SeedSummary {
            skipped: true,
            ..SeedSummary::default()
        });
    }

    let mut summary = SeedSummary::default();

    let clients = [
        json!({ "name": "Ahmed Hassan", "email": "ahmed.hassan@example.com",
                "phone_number": "+20 100 123 4567", "company": "Nile Bakery", "role": "client" }),
        json!({ "name": "Sara Adel", "email": "sara.adel@example.com",
                "company": "Adel Fashion", "role": "client" }),
        json!({ "name": "Youssef Karim", "email": "youssef@example.com",
                "phone_number": "+20 111 765 4321", "role": "client" }),
    ];
    let mut client_ids = Vec::new();
    for client in clients {
        let row = source.insert(Collection::Users, record_from(client)?).await?;
        client_ids.push(row.get("id").cloned().unwrap_or_default());
        summary.clients += 1;
    }

    let services = [
        json!({ "service_name": "Social Media Management", "price": 4500.0,
                "category": "social", "duration_days": 30,
                "description": "Monthly content calendar and community management" }),
        json!({ "service_name": "Logo Design", "price": 1500.0,
                "category": "design", "duration_days": 7 }),
        json!({ "service_name": "Google Ads Setup", "price": 2500.0,
                "category": "ads", "duration_days": 5 }),
        json!({ "service_name": "SEO Audit", "price": 1800.0,
                "category": "seo", "duration_days": 10 }),
    ];
    let mut service_ids = Vec::new();
    for service in services {
        let row = source.insert(Collection::Services, record_from(service)?).await?;
        service_ids.push(row.get("id").cloned().unwrap_or_default());
        summary.services += 1;
    }

    let orders = [
        (0, 0, "pending", "2026-10-14T10:15:00.000Z", "Start with Instagram"),
        (1, 1, "pending", "2026-10-15T08:40:00.000Z", "Two logo concepts"),
        (2, 2, "active", "2026-10-10T12:00:00.000Z", ""),
        (0, 3, "completed", "2026-09-20T09:00:00.000Z", ""),
    ];
    for (client, service, status, created_at, notes) in orders {
        let order = json!({
            "user_id": client_ids[client],
            "service_id": service_ids[service],
            "status": status,
            "created_at": created_at,
            "notes": if notes.is_empty() { None } else { Some(notes) },
        });
        source.insert(Collection::Orders, record_from(order)?).await?;
        summary.orders += 1;
    }

    let campaigns = [
        json!({ "campaign_name": "Autumn Collection Launch", "platform": "Instagram",
                "budget": 12000.0, "status": "active", "start_date": "2026-10-01",
                "end_date": "2026-10-31", "objective": "awareness",
                "client_id": client_ids[1] }),
        json!({ "campaign_name": "Bakery Local Reach", "platform": "Facebook",
                "budget": 3500.0, "status": "active", "start_date": "2026-10-05",
                "objective": "traffic", "client_id": client_ids[0] }),
        json!({ "campaign_name": "Search Leads Q4", "platform": "Google Ads",
                "budget": 8000.0, "status": "paused", "start_date": "2026-09-15",
                "objective": "leads", "client_id": client_ids[2] }),
    ];
    for campaign in campaigns {
        source.insert(Collection::Campaigns, record_from(campaign)?).await?;
        summary.campaigns += 1;
    }

    info!(
        clients = summary.clients,
        services = summary.services,
        orders = summary.orders,
        campaigns = summary.campaigns,
        "Demo data seeded"
    );
    Ok(summary)
}
