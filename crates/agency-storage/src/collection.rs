//! The record collections exposed by the agency backend.

use std::fmt;

/// A named collection (table) in the record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Orders,
    /// Clients and staff accounts, told apart by `role`.
    Users,
    Campaigns,
    Services,
}

const ORDER_COLUMNS: &[&str] = &["id", "user_id", "service_id", "notes", "status", "created_at"];

const USER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "phone_number",
    "company",
    "role",
    "created_at",
];

const CAMPAIGN_COLUMNS: &[&str] = &[
    "id",
    "campaign_name",
    "platform",
    "budget",
    "status",
    "start_date",
    "end_date",
    "objective",
    "description",
    "client_id",
    "created_at",
];

const SERVICE_COLUMNS: &[&str] = &[
    "id",
    "service_name",
    "description",
    "price",
    "category",
    "duration_days",
    "created_at",
];

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Orders,
        Collection::Users,
        Collection::Campaigns,
        Collection::Services,
    ];

    /// Table name in the backing store.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Users => "users",
            Collection::Campaigns => "campaigns",
            Collection::Services => "services",
        }
    }

    /// Column whitelist. Field names are never interpolated unless listed here.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Collection::Orders => ORDER_COLUMNS,
            Collection::Users => USER_COLUMNS,
            Collection::Campaigns => CAMPAIGN_COLUMNS,
            Collection::Services => SERVICE_COLUMNS,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Foreign-key column on `self` that points at `target`, if the two are related.
    pub fn foreign_key_to(&self, target: Collection) -> Option<&'static str> {
        match (self, target) {
            (Collection::Orders, Collection::Users) => Some("user_id"),
            (Collection::Orders, Collection::Services) => Some("service_id"),
            (Collection::Campaigns, Collection::Users) => Some("client_id"),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_collection_has_id_and_created_at() {
        for collection in Collection::ALL {
            assert!(collection.has_column("id"), "{} lacks id", collection);
            assert!(collection.has_column("created_at"), "{} lacks created_at", collection);
        }
    }

    #[test]
    fn test_foreign_keys() {
        assert_eq!(Collection::Orders.foreign_key_to(Collection::Users), Some("user_id"));
        assert_eq!(
            Collection::Orders.foreign_key_to(Collection::Services),
            Some("service_id")
        );
        assert_eq!(Collection::Campaigns.foreign_key_to(Collection::Users), Some("client_id"));
        assert_eq!(Collection::Services.foreign_key_to(Collection::Orders), None);
        assert_eq!(Collection::Users.foreign_key_to(Collection::Orders), None);
    }

    #[test]
    fn test_foreign_key_columns_are_whitelisted() {
        for from in Collection::ALL {
            for to in Collection::ALL {
                if let Some(fk) = from.foreign_key_to(to) {
                    assert!(from.has_column(fk));
                }
            }
        }
    }

    #[test]
    fn test_unknown_column() {
        assert!(!Collection::Users.has_column("password"));
        assert!(!Collection::Orders.has_column("id; DROP TABLE orders"));
    }

    #[test]
    fn test_display_is_table_name() {
        assert_eq!(Collection::Campaigns.to_string(), "campaigns");
    }
}
