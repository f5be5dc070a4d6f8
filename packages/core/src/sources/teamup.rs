//! Tourist board calendar hosted on Teamup (JSON API).
//!
//! The calendar is queried for a window running from today to one month
//! ahead, so past events never leave the upstream.

use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use chrono_tz::Tz;
use reqwest::Url;
use serde::Deserialize;

use crate::event::{non_blank, Event, Location, Organizer};
use crate::services::HttpFetcher;

use super::dates::parse_timestamp;
use super::error::{SourceError, SourceResult};
use super::{EventSource, RawId};

pub const DEFAULT_BASE_URL: &str = "https://teamup.com";
pub const DEFAULT_CALENDAR: &str = "ksitdko5fjg57vfxnv";

const ID_PREFIX: &str = "tz-";

pub struct TeamupSource {
    http: HttpFetcher,
    base_url: String,
    calendar: String,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct TeamupResponse {
    events: Vec<TeamupEvent>,
}

#[derive(Debug, Deserialize)]
struct TeamupEvent {
    id: RawId,
    title: Option<String>,
    start_dt: Option<String>,
    end_dt: Option<String>,
    location: Option<String>,
    who: Option<String>,
    notes: Option<String>,
}

impl TeamupSource {
    pub fn new(
        http: HttpFetcher,
        base_url: impl Into<String>,
        calendar: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            calendar: calendar.into(),
            timezone,
        }
    }

    /// Events URL for the window `[today, today + 1 month]` in the venue timezone.
    fn events_url(&self, now: DateTime<Utc>) -> SourceResult<Url> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let until = today
            .checked_add_months(Months::new(1))
            .ok_or_else(|| SourceError::format(format!("Date range overflow from {}", today)))?;

        let base = format!("{}/{}/events", self.base_url, self.calendar);
        Url::parse_with_params(
            &base,
            &[
                ("startDate", today.format("%Y-%m-%d").to_string()),
                ("endDate", until.format("%Y-%m-%d").to_string()),
                ("tz", self.timezone.name().to_string()),
            ],
        )
        .map_err(|err| SourceError::format(format!("Invalid Teamup URL '{}': {}", base, err)))
    }

    fn map_response(&self, response: TeamupResponse) -> SourceResult<Vec<Event>> {
        response
            .events
            .into_iter()
            .map(|item| self.map_item(item))
            .collect()
    }

    fn map_item(&self, item: TeamupEvent) -> SourceResult<Event> {
        let local_id = item.id.to_string();
        if local_id.is_empty() {
            return Err(SourceError::format("Teamup event without id"));
        }

        let parse = |raw: Option<String>| {
            non_blank(raw)
                .map(|raw| parse_timestamp(&raw, self.timezone))
                .transpose()
        };

        let mut event = Event::new(format!("{}{}", ID_PREFIX, local_id));
        event.name = non_blank(item.title);
        event.start_date = parse(item.start_dt)?;
        event.end_date = parse(item.end_dt)?;
        event.location = Location::named(item.location);
        event.organizer = Organizer::named(item.who);
        event.description = non_blank(item.notes);
        Ok(event)
    }
}

#[async_trait]
impl EventSource for TeamupSource {
    fn name(&self) -> &str {
        "teamup"
    }

    async fn fetch_and_map(&self) -> SourceResult<Vec<Event>> {
        let url = self.events_url(Utc::now())?;
        let response: TeamupResponse = self.http.get_json(url.as_str()).await?;
        self.map_response(response)
    }
}
