//! Fan-out/fan-in over all registered sources.
//!
//! One aggregation run calls every source concurrently, concatenates what
//! succeeded, drops events that started before today and sorts the rest.
//! A failing source is logged and skipped; only a run in which every source
//! fails is an error.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use thiserror::Error;

use crate::event::Event;
use crate::sources::dates::start_of_day;
use crate::sources::{EventSource, SourceError};

pub type SharedSource = Arc<dyn EventSource + Send + Sync>;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("All {} event sources failed", .failures.len())]
    AllSourcesFailed { failures: Vec<SourceFailure> },
}

/// A source that failed during a run, kept for reporting.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub error: SourceError,
}

/// Output of one successful run.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub events: Vec<Event>,
    pub failures: Vec<SourceFailure>,
}

pub struct Aggregator {
    sources: Vec<SharedSource>,
    timezone: Tz,
}

impl Aggregator {
    /// `timezone` defines where "today" starts for the past-event filter.
    pub fn new(timezone: Tz) -> Self {
        Self {
            sources: Vec::new(),
            timezone,
        }
    }

    pub fn with_source(mut self, source: SharedSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub async fn aggregate(&self) -> Result<Aggregation, AggregateError> {
        self.aggregate_at(Utc::now()).await
    }

    /// Run all sources, treating `now` as the current instant.
    pub async fn aggregate_at(&self, now: DateTime<Utc>) -> Result<Aggregation, AggregateError> {
        let results = join_all(self.sources.iter().map(|source| async move {
            (source.name().to_string(), source.fetch_and_map().await)
        }))
        .await;

        let mut events = Vec::new();
        let mut failures = Vec::new();
        for (source, result) in results {
            match result {
                Ok(mapped) => {
                    tracing::debug!("Source {} returned {} events", source, mapped.len());
                    events.extend(mapped);
                }
                Err(error) => {
                    tracing::warn!("Source {} failed, skipping it this run: {}", source, error);
                    failures.push(SourceFailure { source, error });
                }
            }
        }

        if !self.sources.is_empty() && failures.len() == self.sources.len() {
            return Err(AggregateError::AllSourcesFailed { failures });
        }

        let events = sort_events(retain_upcoming(events, start_of_day(now, self.timezone)));
        Ok(Aggregation { events, failures })
    }
}

/// Drops events whose start lies strictly before `boundary`.
///
/// Events without a start date are always kept.
pub fn retain_upcoming(mut events: Vec<Event>, boundary: DateTime<Utc>) -> Vec<Event> {
    events.retain(|event| event.start_date.map_or(true, |start| start >= boundary));
    events
}

/// Stable sort by start date, then end date; absent dates sort last.
pub fn sort_events(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| {
        compare_dates(a.start_date, b.start_date).then_with(|| compare_dates(a.end_date, b.end_date))
    });
    events
}

fn compare_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
