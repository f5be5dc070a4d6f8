use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use krizevci_events::aggregator::Aggregator;
use krizevci_events::api::{self, ApiState};
use krizevci_events::cache::EventCache;
use krizevci_events::cli::Cli;
use krizevci_events::config::Config;
use krizevci_events::error::AppError;
use krizevci_events::logging::init_logging;
use krizevci_events::metrics::AppMetrics;
use krizevci_events::scheduler::RefreshScheduler;
use krizevci_events::service::EventService;
use krizevci_events::services::HttpFetcher;
use krizevci_events::sources::{city, futurehub, teamup};
use krizevci_events::sources::{CityPortalSource, FutureHubSource, TeamupSource};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()
        .and_then(|config| config.with_cli(&cli))
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });

    tracing::info!("Service started with config: {:?}", config);

    if let Err(err) = run(config).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let http = HttpFetcher::new(config.fetch_timeout, config.fetch_retries)
        .map_err(|err| AppError::Config(err.to_string()))?;

    let city_portal = CityPortalSource::new(http.clone(), city::DEFAULT_LISTING_URL, config.timezone)
        .map_err(|err| AppError::Config(err.to_string()))?;

    let aggregator = Aggregator::new(config.timezone)
        .with_source(Arc::new(FutureHubSource::new(
            http.clone(),
            futurehub::DEFAULT_BASE_URL,
            config.timezone,
        )))
        .with_source(Arc::new(TeamupSource::new(
            http,
            teamup::DEFAULT_BASE_URL,
            teamup::DEFAULT_CALENDAR,
            config.timezone,
        )))
        .with_source(Arc::new(city_portal));

    let metrics = Arc::new(AppMetrics::new()?);
    let cache = Arc::new(RwLock::new(EventCache::new()));
    let service = Arc::new(
        EventService::new(aggregator, cache, config.cache_ttl).with_metrics(metrics.clone()),
    );

    let refresh = RefreshScheduler::new(service.clone(), config.refresh_interval).start();

    let app = api::create_router(ApiState {
        service,
        metrics,
        refresh_interval: config.refresh_interval,
    });

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|err| AppError::Server(format!("Failed to bind {}: {}", config.bind_addr, err)))?;
    tracing::info!("Listening on {}", config.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received. Stopping server.");
        })
        .await
        .map_err(|err| AppError::Server(err.to_string()));

    refresh.shutdown().await;
    served
}
