//! The data access boundary.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use agency_core::error::{AgencyError, Result};

use crate::collection::Collection;
use crate::query::{ensure_column, Query};

/// A backend row: column name to JSON value, with embedded relations as
/// nested objects.
pub type Record = serde_json::Map<String, Value>;

/// Query and mutation operations against the agency record store.
///
/// Every operation either succeeds or returns an [`AgencyError`]; a query with
/// zero matching rows is a successful empty result, not an error.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the rows matching `query`.
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>>;

    /// Count the rows matching `query` without fetching them.
    async fn count(&self, query: &Query) -> Result<u64>;

    /// Insert a row, generating an `id` when none is given. Returns the stored row.
    async fn insert(&self, collection: Collection, record: Record) -> Result<Record>;

    /// Apply `changes` to every row matching `query`. Returns the number of rows changed.
    async fn update(&self, query: &Query, changes: Record) -> Result<u64>;

    /// Delete every row matching `query`. Returns the number of rows removed.
    async fn delete(&self, query: &Query) -> Result<u64>;
}

/// Decode backend rows into typed records.
pub fn decode_records<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|r| serde_json::from_value(Value::Object(r)).map_err(AgencyError::from))
        .collect()
}

/// Turn a JSON object literal into a [`Record`].
pub fn record_from(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AgencyError::InvalidValue(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Check that every key of a record to be written is a known column.
pub(crate) fn validate_record(collection: Collection, record: &Record) -> Result<()> {
    if record.is_empty() {
        return Err(AgencyError::InvalidValue(format!(
            "empty record for '{}'",
            collection
        )));
    }
    for key in record.keys() {
        ensure_column(collection, key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_core::types::Service;
    use serde_json::json;

    #[test]
    fn test_decode_records() {
        let rows = vec![record_from(json!({
            "id": "s1",
            "service_name": "SEO Audit",
            "price": 2500.0
        }))
        .unwrap()];
        let services: Vec<Service> = decode_records(rows).unwrap();
        assert_eq!(services[0].service_name, "SEO Audit");
        assert_eq!(services[0].price, 2500.0);
    }

    #[test]
    fn test_decode_records_reports_missing_field() {
        let rows = vec![record_from(json!({ "id": "s1" })).unwrap()];
        let err = decode_records::<Service>(rows).unwrap_err();
        assert!(matches!(err, AgencyError::Serialization(_)));
    }

    #[test]
    fn test_record_from_rejects_non_object() {
        assert!(record_from(json!([1, 2])).is_err());
        assert!(record_from(json!("text")).is_err());
    }

    #[test]
    fn test_validate_record() {
        let ok = record_from(json!({ "name": "Mona", "role": "client" })).unwrap();
        assert!(validate_record(Collection::Users, &ok).is_ok());

        let bad = record_from(json!({ "name": "Mona", "is_admin": true })).unwrap();
        assert!(matches!(
            validate_record(Collection::Users, &bad),
            Err(AgencyError::UnknownField { .. })
        ));

        assert!(validate_record(Collection::Users, &Record::new()).is_err());
    }
}
