//! The event service: the one owner of the aggregator and the result cache.
//!
//! Both the refresh scheduler and the query interface hold an
//! `Arc<EventService>`. Reads never wait on upstream sources while anything
//! is cached, and only one refresh runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;

use crate::aggregator::{AggregateError, Aggregator, SourceFailure};
use crate::cache::EventCache;
use crate::event::Event;
use crate::metrics::AppMetrics;

pub type SharedEventCache = Arc<RwLock<EventCache>>;

pub struct EventService {
    aggregator: Aggregator,
    cache: SharedEventCache,
    ttl: Duration,
    refresh_lock: Mutex<()>,
    /// Set when the on-demand run for a cold cache failed; cleared by the
    /// next explicit refresh.
    cold_start_failed: AtomicBool,
    metrics: Option<Arc<AppMetrics>>,
}

impl EventService {
    pub fn new(aggregator: Aggregator, cache: SharedEventCache, ttl: Duration) -> Self {
        Self {
            aggregator,
            cache,
            ttl,
            refresh_lock: Mutex::new(()),
            cold_start_failed: AtomicBool::new(false),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &SharedEventCache {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Run one aggregation and replace the cache entry with its output.
    ///
    /// When every source fails the previous entry is left in place.
    /// Returns the number of cached events.
    pub async fn refresh(&self) -> Result<usize, AggregateError> {
        let _writer = self.refresh_lock.lock().await;
        let result = self.refresh_locked().await;
        self.cold_start_failed.store(false, Ordering::Release);
        result
    }

    async fn refresh_locked(&self) -> Result<usize, AggregateError> {
        let started = Instant::now();
        let result = self.aggregator.aggregate().await;
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.refreshes_total.inc();
            metrics.refresh_duration.observe(elapsed.as_secs_f64());
        }

        match result {
            Ok(aggregation) => {
                self.record_source_failures(&aggregation.failures);
                let count = aggregation.events.len();
                self.cache.write().await.set(aggregation.events, self.ttl);

                if let Some(metrics) = &self.metrics {
                    metrics.events_cached.set(count as f64);
                }
                tracing::info!(
                    "Event cache refreshed: {} events, {} of {} sources failed ({} ms)",
                    count,
                    aggregation.failures.len(),
                    self.aggregator.source_count(),
                    elapsed.as_millis()
                );
                Ok(count)
            }
            Err(err) => {
                let AggregateError::AllSourcesFailed { failures } = &err;
                self.record_source_failures(failures);
                if let Some(metrics) = &self.metrics {
                    metrics.refresh_failures_total.inc();
                }
                tracing::error!("Refresh failed, keeping previous cache entry: {}", err);
                Err(err)
            }
        }
    }

    fn record_source_failures(&self, failures: &[SourceFailure]) {
        if let Some(metrics) = &self.metrics {
            for failure in failures {
                metrics
                    .source_failures_total
                    .with_label_values(&[failure.source.as_str()])
                    .inc();
            }
        }
    }

    /// Best available event list. Never fails.
    pub async fn list_events(&self) -> Vec<Event> {
        self.list_events_with_timestamp().await.0
    }

    /// Best available event list together with the time it was refreshed,
    /// both taken from the same cache entry.
    ///
    /// Any cached entry is returned as is, stale or not; refreshing it is
    /// the scheduler's job. Only a cold cache runs one on-demand
    /// aggregation, and after that fails reads stay empty until the next
    /// [`EventService::refresh`].
    pub async fn list_events_with_timestamp(&self) -> (Vec<Event>, Option<DateTime<Utc>>) {
        if let Some(cached) = self.read_cached().await {
            return cached;
        }
        if self.cold_start_failed.load(Ordering::Acquire) {
            return (Vec::new(), None);
        }

        let _writer = self.refresh_lock.lock().await;
        if let Some(cached) = self.read_cached().await {
            return cached;
        }
        if self.cold_start_failed.load(Ordering::Acquire) {
            return (Vec::new(), None);
        }

        tracing::info!("Event cache is empty, running on-demand refresh");
        if self.refresh_locked().await.is_err() {
            self.cold_start_failed.store(true, Ordering::Release);
        }
        self.read_cached().await.unwrap_or_default()
    }

    async fn read_cached(&self) -> Option<(Vec<Event>, Option<DateTime<Utc>>)> {
        let cache = self.cache.read().await;
        cache
            .get_stale()
            .map(|events| (events, cache.refreshed_at()))
    }
}
