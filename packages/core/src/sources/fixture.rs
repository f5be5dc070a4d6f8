//! In-memory source returning canned records or a canned error.
//!
//! Used by tests and for running the service without touching upstreams.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::event::Event;

use super::error::{SourceError, SourceResult};
use super::EventSource;

#[derive(Debug)]
pub struct FixtureSource {
    name: String,
    events: Vec<Event>,
    error: Option<SourceError>,
    calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn with_error(mut self, error: SourceError) -> Self {
        self.error = Some(error);
        self
    }

    /// How many times `fetch_and_map` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_and_map(&self) -> SourceResult<Vec<Event>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.events.clone()),
        }
    }
}
