//! Adapter tests against wiremocked upstreams.
//!
//! Every adapter is exercised end-to-end through `HttpFetcher`: the real
//! request shape, envelope decoding, transport failures and timeouts.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use chrono_tz::Europe::Zagreb;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use krizevci_events::{
    services::HttpFetcher,
    sources::{
        teamup, CityPortalSource, EventSource, FutureHubSource, SourceError, TeamupSource,
    },
};

// ---- Helpers ----------------------------------------------------------------

fn fetcher(retries: u32) -> HttpFetcher {
    HttpFetcher::new(Duration::from_millis(500), retries).unwrap()
}

/// `dd.mm.yy.` for a day relative to today in the venue timezone.
fn short_date_in_days(days: i64) -> String {
    (Utc::now().with_timezone(&Zagreb).date_naive() + ChronoDuration::days(days))
        .format("%d.%m.%y.")
        .to_string()
}

const FUTUREHUB_BODY: &str = r#"{
    "data": [
        {
            "id": 7,
            "attributes": {
                "title": "Uvod u robotiku",
                "datetime": "2030-05-04T16:00:00.000Z",
                "place": "Future Hub",
                "course_code": "robotika-1",
                "status": "Predstoji/traje"
            }
        },
        {
            "id": 6,
            "attributes": {
                "title": "Završena radionica",
                "datetime": "2023-05-04T16:00:00.000Z",
                "place": "Future Hub",
                "course_code": "old",
                "status": "Završeno"
            }
        }
    ]
}"#;

const TEAMUP_BODY: &str = r#"{
    "events": [
        {
            "id": "88",
            "title": "Koncert na trgu",
            "start_dt": "2030-06-01T20:00:00+02:00",
            "end_dt": "2030-06-01T22:00:00+02:00",
            "location": "Strossmayerov trg",
            "who": "TZ Križevci",
            "notes": null
        }
    ]
}"#;

// ---- Future Hub -------------------------------------------------------------

#[tokio::test]
async fn futurehub_maps_upcoming_programmes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FUTUREHUB_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let source = FutureHubSource::new(fetcher(0), server.uri(), Zagreb);
    let events = source.fetch_and_map().await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "fh-7");
    assert_eq!(
        events[0].url.as_deref(),
        Some(format!("{}/program/robotika-1", server.uri()).as_str())
    );
}

#[tokio::test]
async fn futurehub_ids_are_stable_across_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FUTUREHUB_BODY, "application/json"))
        .mount(&server)
        .await;

    let source = FutureHubSource::new(fetcher(0), server.uri(), Zagreb);
    let first = source.fetch_and_map().await.unwrap();
    let second = source.fetch_and_map().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn futurehub_unexpected_envelope_is_a_format_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"items": []}"#, "application/json"))
        .mount(&server)
        .await;

    let source = FutureHubSource::new(fetcher(0), server.uri(), Zagreb);
    let err = source.fetch_and_map().await.unwrap_err();

    assert!(matches!(err, SourceError::UpstreamFormat { .. }));
}

// ---- Teamup -----------------------------------------------------------------

#[tokio::test]
async fn teamup_requests_a_dated_window_in_venue_timezone() {
    let server = MockServer::start().await;
    let today = Utc::now().with_timezone(&Zagreb).date_naive();
    Mock::given(method("GET"))
        .and(path(format!("/{}/events", teamup::DEFAULT_CALENDAR)))
        .and(query_param("startDate", today.format("%Y-%m-%d").to_string()))
        .and(query_param("tz", "Europe/Zagreb"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TEAMUP_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let source = TeamupSource::new(fetcher(0), server.uri(), teamup::DEFAULT_CALENDAR, Zagreb);
    let events = source.fetch_and_map().await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "tz-88");
    assert!(events[0].end_date > events[0].start_date);
}

#[tokio::test]
async fn teamup_ids_are_stable_across_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/events", teamup::DEFAULT_CALENDAR)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TEAMUP_BODY, "application/json"))
        .expect(2)
        .mount(&server)
        .await;

    let source = TeamupSource::new(fetcher(0), server.uri(), teamup::DEFAULT_CALENDAR, Zagreb);
    let first = source.fetch_and_map().await.unwrap();
    let second = source.fetch_and_map().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].id, "tz-88");
}

#[tokio::test]
async fn teamup_client_error_is_a_transport_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let source = TeamupSource::new(fetcher(3), server.uri(), teamup::DEFAULT_CALENDAR, Zagreb);
    let err = source.fetch_and_map().await.unwrap_err();

    assert!(matches!(err, SourceError::Transport { .. }));
}

// ---- Transport --------------------------------------------------------------

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let source = FutureHubSource::new(fetcher(1), server.uri(), Zagreb);
    let err = source.fetch_and_map().await.unwrap_err();

    match err {
        SourceError::Transport { message } => assert!(message.contains("503"), "{}", message),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FUTUREHUB_BODY, "application/json")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let source = FutureHubSource::new(fetcher(0), server.uri(), Zagreb);
    let err = source.fetch_and_map().await.unwrap_err();

    assert!(matches!(err, SourceError::Transport { .. }));
}

// ---- City portal ------------------------------------------------------------

fn detail_page(title: &str, date: &str, hour: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="event-title">{title}</h1>
            <span class="event-date">{date}</span>
            <span class="event-time">{hour}</span>
            <p class="event-location">Gradska vijećnica</p>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn city_portal_follows_listing_links() {
    let server = MockServer::start().await;
    let listing = r#"<ul class="event-list">
        <li><a class="event-link" href="/dogadanja/predavanje">Predavanje</a></li>
        <li><a class="event-link" href="/dogadanja/izlozba">Izložba</a></li>
        <li><a class="event-link" href="/dogadanja/lani">Lani</a></li>
    </ul>"#;
    mount_html(&server, "/dogadanja/", listing.to_string()).await;
    mount_html(
        &server,
        "/dogadanja/predavanje",
        detail_page("Predavanje", &short_date_in_days(3), "18 h"),
    )
    .await;
    mount_html(
        &server,
        "/dogadanja/izlozba",
        detail_page("Izložba", &short_date_in_days(1), "10 h"),
    )
    .await;
    mount_html(
        &server,
        "/dogadanja/lani",
        detail_page("Lani", &short_date_in_days(-30), "10 h"),
    )
    .await;

    let listing_url = format!("{}/dogadanja/", server.uri());
    let source = CityPortalSource::new(fetcher(0), &listing_url, Zagreb).unwrap();
    let mut events = source.fetch_and_map().await.unwrap();
    events.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, format!("kc-{}/dogadanja/izlozba", server.uri()));
    assert_eq!(events[1].id, format!("kc-{}/dogadanja/predavanje", server.uri()));
    assert!(events.iter().all(|e| e.start_date.is_some()));
}

#[tokio::test]
async fn city_portal_ids_are_stable_across_fetches() {
    let server = MockServer::start().await;
    let listing = r#"<div class="event-list">
        <a class="event-link" href="/dogadanja/sajam">Sajam</a>
        <a class="event-link" href="/dogadanja/koncert">Koncert</a>
    </div>"#;
    mount_html(&server, "/dogadanja/", listing.to_string()).await;
    mount_html(
        &server,
        "/dogadanja/sajam",
        detail_page("Sajam", &short_date_in_days(5), "9 h"),
    )
    .await;
    mount_html(
        &server,
        "/dogadanja/koncert",
        detail_page("Koncert", &short_date_in_days(2), "20 h"),
    )
    .await;

    let listing_url = format!("{}/dogadanja/", server.uri());
    let source = CityPortalSource::new(fetcher(0), &listing_url, Zagreb).unwrap();
    let first = source.fetch_and_map().await.unwrap();
    let second = source.fetch_and_map().await.unwrap();

    let ids = |events: &[krizevci_events::event::Event]| {
        events.iter().map(|e| e.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(first.len(), 2);
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first, second);
}

#[tokio::test]
async fn city_portal_broken_detail_page_fails_the_adapter() {
    let server = MockServer::start().await;
    let listing = r#"<div class="event-list"><a class="event-link" href="/dogadanja/nestalo">x</a></div>"#;
    mount_html(&server, "/dogadanja/", listing.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/dogadanja/nestalo"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let listing_url = format!("{}/dogadanja/", server.uri());
    let source = CityPortalSource::new(fetcher(0), &listing_url, Zagreb).unwrap();

    assert!(matches!(
        source.fetch_and_map().await,
        Err(SourceError::Transport { .. })
    ));
}

#[tokio::test]
async fn city_portal_empty_listing_yields_no_events() {
    let server = MockServer::start().await;
    mount_html(&server, "/dogadanja/", "<html><body>Nema događanja.</body></html>".to_string()).await;

    let listing_url = format!("{}/dogadanja/", server.uri());
    let source = CityPortalSource::new(fetcher(0), &listing_url, Zagreb).unwrap();

    assert!(source.fetch_and_map().await.unwrap().is_empty());
}
