//! [`DataSource`] backed by the embedded SQLite database.
//!
//! Queries are translated into parameterised SQL. Identifiers come only from
//! the collection whitelists, checked by [`Query::validate`] before any
//! statement is prepared.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use agency_core::error::{AgencyError, Result};

use crate::collection::Collection;
use crate::db::Database;
use crate::query::{Filter, Query};
use crate::source::{validate_record, DataSource, Record};

/// SQLite implementation of the data access boundary.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    db: Arc<Database>,
}

impl SqliteSource {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fresh in-memory store with the schema applied.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Database::in_memory()?)))
    }
}

#[async_trait]
impl DataSource for SqliteSource {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        query.validate()?;

        // Foreign keys needed for embedding are always selected and stripped
        // again afterwards when the caller did not ask for them.
        let mut columns = query.columns.clone();
        let mut hidden = Vec::new();
        if !columns.is_empty() {
            for embed in &query.embeds {
                if let Some(fk) = query.collection.foreign_key_to(embed.collection) {
                    if !columns.iter().any(|c| c == fk) {
                        columns.push(fk.to_string());
                        hidden.push(fk);
                    }
                }
            }
        }

        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM \"{}\"",
            column_list(&columns),
            query.collection.table()
        );
        sql.push_str(&where_clause(&query.filters, &mut params)?);
        if let Some(order) = &query.order {
            sql.push_str(&format!(
                " ORDER BY \"{}\" {}",
                order.field,
                if order.descending { "DESC" } else { "ASC" }
            ));
        }
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(limit as i64));
        }
        debug!(sql = %sql, "sqlite fetch");

        self.db.with_conn(|conn| {
            let mut rows = select_rows(conn, &sql, &params)?;
            for row in rows.iter_mut() {
                for embed in &query.embeds {
                    let Some(fk) = query.collection.foreign_key_to(embed.collection) else {
                        continue;
                    };
                    let related = match row.get(fk) {
                        Some(Value::String(id)) => {
                            lookup_by_id(conn, embed.collection, &embed.columns, id)?
                        }
                        _ => None,
                    };
                    row.insert(
                        embed.collection.table().to_string(),
                        related.map(Value::Object).unwrap_or(Value::Null),
                    );
                }
                for fk in &hidden {
                    row.remove(*fk);
                }
            }
            Ok(rows)
        })
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        query.validate()?;
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM \"{}\"", query.collection.table());
        sql.push_str(&where_clause(&query.filters, &mut params)?);

        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
                .map_err(storage_err)?;
            Ok(count.max(0) as u64)
        })
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record> {
        validate_record(collection, &record)?;
        let mut record = record;
        let id = match record.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Null) | None => {
                let id = Uuid::new_v4().to_string();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
            Some(other) => {
                return Err(AgencyError::InvalidValue(format!(
                    "id must be a string, got {}",
                    other
                )))
            }
        };

        let names: Vec<&str> = record.keys().map(String::as_str).collect();
        let params = record
            .values()
            .map(json_to_sql)
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            collection.table(),
            column_list(&names),
            vec!["?"; names.len()].join(", ")
        );

        self.db.with_conn(|conn| {
            conn.execute(&sql, params_from_iter(params.iter()))
                .map_err(storage_err)?;
            lookup_by_id(conn, collection, &[] as &[String], &id)?.ok_or_else(|| {
                AgencyError::Storage(format!("inserted row {} not found in {}", id, collection))
            })
        })
    }

    async fn update(&self, query: &Query, changes: Record) -> Result<u64> {
        query.validate()?;
        query.ensure_filtered("update")?;
        validate_record(query.collection, &changes)?;

        let mut params = Vec::new();
        let mut assignments = Vec::new();
        for (column, value) in &changes {
            assignments.push(format!("\"{}\" = ?", column));
            params.push(json_to_sql(value)?);
        }
        let mut sql = format!(
            "UPDATE \"{}\" SET {}",
            query.collection.table(),
            assignments.join(", ")
        );
        sql.push_str(&where_clause(&query.filters, &mut params)?);

        self.db.with_conn(|conn| {
            let changed = conn
                .execute(&sql, params_from_iter(params.iter()))
                .map_err(storage_err)?;
            Ok(changed as u64)
        })
    }

    async fn delete(&self, query: &Query) -> Result<u64> {
        query.validate()?;
        query.ensure_filtered("delete")?;

        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM \"{}\"", query.collection.table());
        sql.push_str(&where_clause(&query.filters, &mut params)?);

        self.db.with_conn(|conn| {
            let removed = conn
                .execute(&sql, params_from_iter(params.iter()))
                .map_err(storage_err)?;
            Ok(removed as u64)
        })
    }
}

// =============================================================================
// SQL helpers
// =============================================================================

fn storage_err(e: rusqlite::Error) -> AgencyError {
    AgencyError::Storage(e.to_string())
}

fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }
    columns
        .iter()
        .map(|c| format!("\"{}\"", c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(filters: &[Filter], params: &mut Vec<SqlValue>) -> Result<String> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let mut conditions = Vec::with_capacity(filters.len());
    for filter in filters {
        match filter {
            Filter::Eq { field, value } if value.is_null() => {
                conditions.push(format!("\"{}\" IS NULL", field));
            }
            Filter::Eq { field, value } => {
                conditions.push(format!("\"{}\" = ?", field));
                params.push(json_to_sql(value)?);
            }
            Filter::ILike { field, term } => {
                conditions.push(format!("LOWER(\"{}\") LIKE LOWER(?) ESCAPE '\\'", field));
                params.push(SqlValue::Text(like_pattern(term)));
            }
        }
    }
    Ok(format!(" WHERE {}", conditions.join(" AND ")))
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn json_to_sql(value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(AgencyError::InvalidValue(format!("unsupported number {}", n)))
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(AgencyError::InvalidValue(format!(
            "nested values cannot be stored in a column: {}",
            value
        ))),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn select_rows(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
    let mut stmt = conn.prepare(sql).map_err(storage_err)?;
    let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
    let mut rows = stmt
        .query(params_from_iter(params.iter()))
        .map_err(storage_err)?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(storage_err)? {
        let mut record = Record::new();
        for (i, name) in names.iter().enumerate() {
            let value = row.get_ref(i).map_err(storage_err)?;
            record.insert(name.clone(), sql_to_json(value));
        }
        records.push(record);
    }
    Ok(records)
}

fn lookup_by_id<S: AsRef<str>>(
    conn: &Connection,
    collection: Collection,
    columns: &[S],
    id: &str,
) -> Result<Option<Record>> {
    let sql = format!(
        "SELECT {} FROM \"{}\" WHERE \"id\" = ?1",
        column_list(columns),
        collection.table()
    );
    let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
    let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
    stmt.query_row([id], |row| {
        let mut record = Record::new();
        for (i, name) in names.iter().enumerate() {
            record.insert(name.clone(), sql_to_json(row.get_ref(i)?));
        }
        Ok(record)
    })
    .optional()
    .map_err(storage_err)
}
