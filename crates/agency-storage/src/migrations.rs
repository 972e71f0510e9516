//! Database schema migrations.
//!
//! Applies the initial schema: users, services, orders, campaigns and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use agency_core::error::AgencyError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), AgencyError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| AgencyError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| AgencyError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
///
/// Timestamps are RFC 3339 text in UTC so rows decode the same way as rows
/// coming from the hosted backend.
fn apply_v1(conn: &Connection) -> Result<(), AgencyError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY NOT NULL,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            phone_number    TEXT,
            company         TEXT,
            role            TEXT NOT NULL DEFAULT 'client'
                            CHECK (role IN ('client', 'admin', 'staff')),
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_role
            ON users (role, created_at DESC);

        CREATE TABLE IF NOT EXISTS services (
            id              TEXT PRIMARY KEY NOT NULL,
            service_name    TEXT NOT NULL,
            description     TEXT,
            price           REAL NOT NULL DEFAULT 0,
            category        TEXT,
            duration_days   INTEGER,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS orders (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT REFERENCES users(id) ON DELETE SET NULL,
            service_id      TEXT REFERENCES services(id) ON DELETE SET NULL,
            notes           TEXT,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'active', 'completed', 'cancelled')),
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_orders_status
            ON orders (status, created_at DESC);

        CREATE INDEX IF NOT EXISTS idx_orders_user
            ON orders (user_id)
            WHERE user_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS campaigns (
            id              TEXT PRIMARY KEY NOT NULL,
            campaign_name   TEXT NOT NULL,
            platform        TEXT NOT NULL,
            budget          REAL NOT NULL DEFAULT 0,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'active', 'completed', 'paused', 'cancelled')),
            start_date      TEXT,
            end_date        TEXT,
            objective       TEXT,
            description     TEXT,
            client_id       TEXT REFERENCES users(id) ON DELETE SET NULL,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_campaigns_status
            ON campaigns (status, created_at DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| AgencyError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
