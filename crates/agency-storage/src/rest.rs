//! [`DataSource`] backed by a hosted PostgREST endpoint (e.g. a Supabase project).
//!
//! Filters become `field=eq.value` / `field=ilike.*term*` query parameters,
//! embeds become `select=*,users(name)` and counts are read from the
//! `Content-Range` header of a `HEAD` request with `Prefer: count=exact`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use agency_core::error::{AgencyError, Result};

use crate::collection::Collection;
use crate::query::{Filter, Query};
use crate::source::{validate_record, DataSource, Record};

const PREFER: &str = "Prefer";

pub struct RestSource {
    http: HttpClient,
    base_url: String,
}

impl RestSource {
    /// Build a client for `base_url` authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(AgencyError::Config("backend.rest_url is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let key = HeaderValue::from_str(api_key)
                .map_err(|e| AgencyError::Config(format!("invalid api key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AgencyError::Config(format!("invalid api key: {}", e)))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AgencyError::Backend(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AgencyError::Backend(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AgencyError::BackendStatus {
            status: status.as_u16(),
            body,
        })
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Record>> {
        self.send(request)
            .await?
            .json::<Vec<Record>>()
            .await
            .map_err(|e| AgencyError::Serialization(e.to_string()))
    }
}

impl std::fmt::Debug for RestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSource")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl DataSource for RestSource {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        query.validate()?;
        let params = fetch_params(query)?;
        debug!(collection = %query.collection, ?params, "rest fetch");
        self.rows(self.http.get(self.endpoint(query.collection)).query(&params))
            .await
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        query.validate()?;
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(&query.filters)?);
        let response = self
            .send(
                self.http
                    .head(self.endpoint(query.collection))
                    .header(PREFER, "count=exact")
                    .query(&params),
            )
            .await?;
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AgencyError::Backend("count response lacks Content-Range".into()))?;
        parse_content_range(range)
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record> {
        validate_record(collection, &record)?;
        let rows = self
            .rows(
                self.http
                    .post(self.endpoint(collection))
                    .header(PREFER, "return=representation")
                    .json(&record),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AgencyError::Backend(format!("insert into {} returned no row", collection)))
    }

    async fn update(&self, query: &Query, changes: Record) -> Result<u64> {
        query.validate()?;
        query.ensure_filtered("update")?;
        validate_record(query.collection, &changes)?;
        let filters = filter_params(&query.filters)?;
        let rows = self
            .rows(
                self.http
                    .patch(self.endpoint(query.collection))
                    .header(PREFER, "return=representation")
                    .query(&filters)
                    .json(&changes),
            )
            .await?;
        Ok(rows.len() as u64)
    }

    async fn delete(&self, query: &Query) -> Result<u64> {
        query.validate()?;
        query.ensure_filtered("delete")?;
        let filters = filter_params(&query.filters)?;
        let rows = self
            .rows(
                self.http
                    .delete(self.endpoint(query.collection))
                    .header(PREFER, "return=representation")
                    .query(&filters),
            )
            .await?;
        Ok(rows.len() as u64)
    }
}

// =============================================================================
// PostgREST encoding
// =============================================================================

fn select_param(query: &Query) -> String {
    let mut parts = Vec::new();
    if query.columns.is_empty() {
        parts.push("*".to_string());
    } else {
        parts.extend(query.columns.iter().cloned());
    }
    for embed in &query.embeds {
        let columns = if embed.columns.is_empty() {
            "*".to_string()
        } else {
            embed.columns.join(",")
        };
        parts.push(format!("{}({})", embed.collection.table(), columns));
    }
    parts.join(",")
}

fn filter_params(filters: &[Filter]) -> Result<Vec<(String, String)>> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq { field, value } => {
                let operand = match value {
                    Value::Null => "is.null".to_string(),
                    Value::String(s) => format!("eq.{}", s),
                    other => format!("eq.{}", other),
                };
                Ok((field.clone(), operand))
            }
            Filter::ILike { field, term } => {
                Ok((field.clone(), format!("ilike.*{}*", ilike_literal(term)?)))
            }
        })
        .collect()
}

/// Escape `term` so it matches only itself inside an `ilike.*...*` operand.
///
/// PostgREST rewrites every `*` to `%` before the pattern reaches Postgres,
/// so a literal asterisk cannot be expressed and is refused.
fn ilike_literal(term: &str) -> Result<String> {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '*' => {
                return Err(AgencyError::InvalidValue(format!(
                    "'*' cannot be searched for literally: {}",
                    term
                )))
            }
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    Ok(escaped)
}

fn fetch_params(query: &Query) -> Result<Vec<(String, String)>> {
    let mut params = vec![("select".to_string(), select_param(query))];
    params.extend(filter_params(&query.filters)?);
    if let Some(order) = &query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", order.field, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    Ok(params)
}

/// Total from a `Content-Range` value such as `0-4/42` or `*/0`.
fn parse_content_range(value: &str) -> Result<u64> {
    value
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| AgencyError::Backend(format!("unusable Content-Range '{}'", value)))
}
