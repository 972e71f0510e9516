//! Agency storage crate - the data access boundary.
//!
//! Defines the [`DataSource`] trait the chat assistant queries through, a
//! small query model over the four agency collections, and two backends:
//! an embedded SQLite database and a hosted PostgREST endpoint.

pub mod collection;
pub mod db;
pub mod migrations;
pub mod query;
pub mod rest;
pub mod seed;
pub mod source;
pub mod sqlite;
pub mod stats;

pub use collection::Collection;
pub use db::Database;
pub use query::{Embed, Filter, Ordering, Query};
pub use rest::RestSource;
pub use seed::{seed_demo_data, SeedSummary};
pub use source::{decode_records, record_from, DataSource, Record};
pub use sqlite::SqliteSource;
pub use stats::DashboardStats;
