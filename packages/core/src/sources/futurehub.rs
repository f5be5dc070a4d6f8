//! Future Hub Križevci programme (JSON API).

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::event::{non_blank, Event, Location, Organizer};
use crate::services::HttpFetcher;

use super::dates::parse_timestamp;
use super::error::{SourceError, SourceResult};
use super::{EventSource, RawId};

pub const DEFAULT_BASE_URL: &str = "https://futurehub.krizevci.eu";

const ID_PREFIX: &str = "fh-";
const ORGANIZER: &str = "Future Hub Križevci";
/// Status label the API uses for upcoming or ongoing programmes.
const UPCOMING_STATUS: &str = "Predstoji/traje";

pub struct FutureHubSource {
    http: HttpFetcher,
    base_url: String,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct FutureHubResponse {
    data: Vec<FutureHubItem>,
}

#[derive(Debug, Deserialize)]
struct FutureHubItem {
    id: RawId,
    attributes: FutureHubAttributes,
}

#[derive(Debug, Deserialize)]
struct FutureHubAttributes {
    title: Option<String>,
    datetime: Option<String>,
    place: Option<String>,
    course_code: Option<String>,
    status: Option<String>,
}

impl FutureHubSource {
    pub fn new(http: HttpFetcher, base_url: impl Into<String>, timezone: Tz) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timezone,
        }
    }

    fn map_response(&self, response: FutureHubResponse) -> SourceResult<Vec<Event>> {
        response
            .data
            .into_iter()
            .filter(|item| item.attributes.status.as_deref() == Some(UPCOMING_STATUS))
            .map(|item| self.map_item(item))
            .collect()
    }

    fn map_item(&self, item: FutureHubItem) -> SourceResult<Event> {
        let local_id = item.id.to_string();
        if local_id.is_empty() {
            return Err(SourceError::format("Future Hub item without id"));
        }

        let attributes = item.attributes;
        let start_date = non_blank(attributes.datetime)
            .map(|raw| parse_timestamp(&raw, self.timezone))
            .transpose()?;

        let mut event = Event::new(format!("{}{}", ID_PREFIX, local_id));
        event.name = non_blank(attributes.title);
        event.start_date = start_date;
        event.location = Location::named(attributes.place);
        event.organizer = Organizer::named(Some(ORGANIZER.to_string()));
        event.url = non_blank(attributes.course_code)
            .map(|code| format!("{}/program/{}", self.base_url, code));
        Ok(event)
    }
}

#[async_trait]
impl EventSource for FutureHubSource {
    fn name(&self) -> &str {
        "futurehub"
    }

    async fn fetch_and_map(&self) -> SourceResult<Vec<Event>> {
        let url = format!("{}/api/events/", self.base_url);
        let response: FutureHubResponse = self.http.get_json(&url).await?;
        self.map_response(response)
    }
}
