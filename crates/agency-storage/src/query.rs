//! Backend-neutral query description.
//!
//! A [`Query`] names a collection plus optional column selection, equality and
//! partial-match filters, ordering, limit and embedded relations. Backends
//! translate it into SQL or PostgREST parameters after [`Query::validate`].

use serde_json::Value;

use agency_core::error::{AgencyError, Result};

use crate::collection::Collection;

/// A single row filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `field = value` (`IS NULL` when the value is null).
    Eq { field: String, value: Value },
    /// Case-insensitive partial match of `term` anywhere in `field`.
    ILike { field: String, term: String },
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq { field, .. } | Filter::ILike { field, .. } => field,
        }
    }
}

/// Sort order of a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

/// A related collection to embed into each fetched row, keyed by its table name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embed {
    pub collection: Collection,
    /// Columns of the related row; empty selects all.
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub collection: Collection,
    /// Selected columns; empty selects all.
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
    pub order: Option<Ordering>,
    pub embeds: Vec<Embed>,
}

impl Query {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            columns: Vec::new(),
            filters: Vec::new(),
            limit: None,
            order: None,
            embeds: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn ilike(mut self, field: &str, term: &str) -> Self {
        self.filters.push(Filter::ILike {
            field: field.to_string(),
            term: term.to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order = Some(Ordering {
            field: field.to_string(),
            descending,
        });
        self
    }

    pub fn embed(mut self, collection: Collection, columns: &[&str]) -> Self {
        self.embeds.push(Embed {
            collection,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Check every field name against the collection whitelists and every
    /// embed against the known relations.
    pub fn validate(&self) -> Result<()> {
        let fields = self
            .columns
            .iter()
            .map(String::as_str)
            .chain(self.filters.iter().map(Filter::field))
            .chain(self.order.iter().map(|o| o.field.as_str()));
        for field in fields {
            ensure_column(self.collection, field)?;
        }

        for embed in &self.embeds {
            if self.collection.foreign_key_to(embed.collection).is_none() {
                return Err(AgencyError::InvalidRelation {
                    from: self.collection.to_string(),
                    to: embed.collection.to_string(),
                });
            }
            for column in &embed.columns {
                ensure_column(embed.collection, column)?;
            }
        }
        Ok(())
    }

    /// Reject mutations that would touch every row of the collection.
    pub fn ensure_filtered(&self, operation: &'static str) -> Result<()> {
        if self.filters.is_empty() {
            return Err(AgencyError::UnfilteredMutation {
                operation,
                collection: self.collection.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn ensure_column(collection: Collection, field: &str) -> Result<()> {
    if collection.has_column(field) {
        Ok(())
    } else {
        Err(AgencyError::UnknownField {
            collection: collection.to_string(),
            field: field.to_string(),
        })
    }
}
