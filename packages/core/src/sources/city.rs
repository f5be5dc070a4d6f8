//! City portal event pages (HTML).
//!
//! The listing page only links to events; every field lives on the linked
//! detail page, so one run is a listing fetch followed by one concurrent
//! fetch per discovered detail page. Detail pages carry no id, so the detail
//! URL is the source-local identity.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use futures::future::try_join_all;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::event::{non_blank, Event, Location, Organizer};
use crate::services::HttpFetcher;

use super::dates::{local_to_utc, parse_hour, parse_short_date};
use super::error::{SourceError, SourceResult};
use super::EventSource;

pub const DEFAULT_LISTING_URL: &str = "https://www.krizevci.hr/dogadanja/";

const ID_PREFIX: &str = "kc-";

const LINK_SELECTOR: &str = ".event-list a.event-link[href]";
const TITLE_SELECTOR: &str = "h1.event-title";
const DATE_SELECTOR: &str = ".event-date";
const TIME_SELECTOR: &str = ".event-time";
const END_TIME_SELECTOR: &str = ".event-end-time";
const LOCATION_SELECTOR: &str = ".event-location";
const ORGANIZER_SELECTOR: &str = ".event-organizer";
const DESCRIPTION_SELECTOR: &str = ".event-description";
const IMAGE_SELECTOR: &str = r#"meta[property="og:image"]"#;

pub struct CityPortalSource {
    http: HttpFetcher,
    listing_url: Url,
    timezone: Tz,
}

impl CityPortalSource {
    pub fn new(http: HttpFetcher, listing_url: &str, timezone: Tz) -> SourceResult<Self> {
        let listing_url = Url::parse(listing_url)
            .map_err(|err| SourceError::format(format!("Invalid listing URL '{}': {}", listing_url, err)))?;

        Ok(Self {
            http,
            listing_url,
            timezone,
        })
    }

    /// Absolute, deduplicated detail page URLs in listing order.
    fn detail_links(&self, listing_html: &str) -> SourceResult<Vec<Url>> {
        let document = Html::parse_document(listing_html);
        let links = selector(LINK_SELECTOR)?;

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for href in document.select(&links).filter_map(|a| a.value().attr("href")) {
            let mut url = self.listing_url.join(href.trim()).map_err(|err| {
                SourceError::format(format!("Invalid event link '{}': {}", href, err))
            })?;
            url.set_fragment(None);
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
        Ok(urls)
    }

    /// Maps one detail page. Returns `None` for events dated before `today`.
    fn map_detail(&self, url: &Url, html: &str, today: NaiveDate) -> SourceResult<Option<Event>> {
        let document = Html::parse_document(html);

        let date = first_text(&document, DATE_SELECTOR)?
            .map(|raw| parse_short_date(&raw))
            .transpose()?;
        if date.is_some_and(|date| date < today) {
            return Ok(None);
        }

        let start_time = first_text(&document, TIME_SELECTOR)?
            .map(|raw| parse_hour(&raw))
            .transpose()?;
        let end_time = first_text(&document, END_TIME_SELECTOR)?
            .map(|raw| parse_hour(&raw))
            .transpose()?;

        let (start_date, end_date) = match date {
            Some(date) => {
                let start = local_to_utc(date, start_time.unwrap_or(NaiveTime::MIN), self.timezone)?;
                let end = end_time
                    .map(|time| self.end_after(date, time, start))
                    .transpose()?;
                (Some(start), end)
            }
            None => (None, None),
        };

        let image = first_attr(&document, IMAGE_SELECTOR, "content")?
            .and_then(|src| url.join(&src).ok())
            .map(String::from);

        let mut event = Event::new(format!("{}{}", ID_PREFIX, url));
        event.name = first_text(&document, TITLE_SELECTOR)?;
        event.start_date = start_date;
        event.end_date = end_date;
        event.location = Location::named(first_text(&document, LOCATION_SELECTOR)?);
        event.organizer = Organizer::named(first_text(&document, ORGANIZER_SELECTOR)?);
        event.url = Some(url.to_string());
        event.description = first_text(&document, DESCRIPTION_SELECTOR)?;
        event.image = image;
        Ok(Some(event))
    }

    /// An end hour earlier than the start hour runs past midnight.
    fn end_after(&self, date: NaiveDate, time: NaiveTime, start: DateTime<Utc>) -> SourceResult<DateTime<Utc>> {
        let end = local_to_utc(date, time, self.timezone)?;
        if end < start {
            let next_day = date + Duration::days(1);
            return local_to_utc(next_day, time, self.timezone);
        }
        Ok(end)
    }

    async fn fetch_detail(&self, url: Url, today: NaiveDate) -> SourceResult<Option<Event>> {
        let html = self.http.get_text(url.as_str()).await?;
        self.map_detail(&url, &html, today)
    }
}

#[async_trait]
impl EventSource for CityPortalSource {
    fn name(&self) -> &str {
        "city-portal"
    }

    async fn fetch_and_map(&self) -> SourceResult<Vec<Event>> {
        let listing = self.http.get_text(self.listing_url.as_str()).await?;
        let links = self.detail_links(&listing)?;
        let today = Utc::now().with_timezone(&self.timezone).date_naive();

        tracing::debug!("City portal listing links to {} event pages", links.len());

        let details = try_join_all(links.into_iter().map(|url| self.fetch_detail(url, today))).await?;
        Ok(details.into_iter().flatten().collect())
    }
}

fn selector(css: &str) -> SourceResult<Selector> {
    Selector::parse(css).map_err(|err| SourceError::format(format!("Bad selector '{}': {:?}", css, err)))
}

fn collapse_whitespace(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn first_text(document: &Html, css: &str) -> SourceResult<Option<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .map(collapse_whitespace)
        .and_then(|text| non_blank(Some(text))))
}

fn first_attr(document: &Html, css: &str, attr: &str) -> SourceResult<Option<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .and_then(|value| non_blank(Some(value.to_string()))))
}
