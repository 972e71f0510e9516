//! Fake data sources for composer and session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use agency_core::error::{AgencyError, Result};
use agency_storage::{record_from, Collection, DataSource, Query, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Behavior {
    Answer,
    Fail,
    Panic,
}

/// Answers every fetch with the same rows and every count with the same number.
pub(crate) struct FakeSource {
    behavior: Behavior,
    rows: Vec<Record>,
    count: u64,
    queries: Mutex<Vec<Query>>,
    mutations: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(behavior: Behavior, rows: Vec<Value>, count: u64) -> Self {
        Self {
            behavior,
            rows: rows
                .into_iter()
                .map(|v| record_from(v).expect("fake rows must be objects"))
                .collect(),
            count,
            queries: Mutex::new(Vec::new()),
            mutations: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_rows(rows: Vec<Value>) -> Self {
        let count = rows.len() as u64;
        Self::new(Behavior::Answer, rows, count)
    }

    pub(crate) fn with_count(count: u64) -> Self {
        Self::new(Behavior::Answer, Vec::new(), count)
    }

    pub(crate) fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    pub(crate) fn failing() -> Self {
        Self::new(Behavior::Fail, Vec::new(), 0)
    }

    pub(crate) fn panicking() -> Self {
        Self::new(Behavior::Panic, Vec::new(), 0)
    }

    pub(crate) fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn observe(&self, query: &Query) -> Result<()> {
        self.queries.lock().unwrap().push(query.clone());
        match self.behavior {
            Behavior::Answer => Ok(()),
            Behavior::Fail => Err(AgencyError::Backend("connection refused".into())),
            Behavior::Panic => panic!("fake backend exploded"),
        }
    }

    fn mutate(&self) -> AgencyError {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        AgencyError::Backend("fake source is read-only".into())
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        self.observe(query)?;
        Ok(self.rows.clone())
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        self.observe(query)?;
        Ok(self.count)
    }

    async fn insert(&self, _collection: Collection, _record: Record) -> Result<Record> {
        Err(self.mutate())
    }

    async fn update(&self, _query: &Query, _changes: Record) -> Result<u64> {
        Err(self.mutate())
    }

    async fn delete(&self, _query: &Query) -> Result<u64> {
        Err(self.mutate())
    }
}
