//! Source adapters.
//!
//! Each upstream source implements [`EventSource`] independently and owns its
//! own envelope shape, field naming and date idioms. A format change in one
//! upstream can only ever break that one adapter.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::event::Event;

pub mod city;
pub mod dates;
pub mod error;
pub mod fixture;
pub mod futurehub;
pub mod teamup;

pub use city::CityPortalSource;
pub use error::{SourceError, SourceResult};
pub use fixture::FixtureSource;
pub use futurehub::FutureHubSource;
pub use teamup::TeamupSource;

/// One upstream event source.
#[async_trait]
pub trait EventSource {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &str;

    /// Fetch the upstream data and map it to normalized records.
    async fn fetch_and_map(&self) -> SourceResult<Vec<Event>>;
}

/// Upstream ids arrive as JSON numbers or strings depending on the source.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(id) => write!(f, "{}", id),
            RawId::Text(id) => write!(f, "{}", id.trim()),
        }
    }
}
