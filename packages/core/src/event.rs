//! Normalized event record.
//!
//! Every source adapter maps its upstream representation into [`Event`].
//! Records are built fresh on each aggregation run and never mutated after
//! an adapter hands them over; the aggregator only filters and reorders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: Option<String>,
}

impl Location {
    /// `None` when the upstream gave no usable name.
    pub fn named(name: Option<String>) -> Option<Self> {
        non_blank(name).map(|name| Self { name: Some(name) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    pub name: Option<String>,
}

impl Organizer {
    pub fn named(name: Option<String>) -> Option<Self> {
        non_blank(name).map(|name| Self { name: Some(name) })
    }
}

/// A single public event, independent of the source it came from.
///
/// `id` carries a per-source prefix so records from different sources can
/// never collide in the merged collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub organizer: Option<Organizer>,
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Event {
    /// Bare record with only an id; adapters fill in what they know.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            start_date: None,
            end_date: None,
            location: None,
            organizer: None,
            url: None,
            description: None,
            image: None,
        }
    }
}

/// Trims the value and drops it if nothing is left.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
