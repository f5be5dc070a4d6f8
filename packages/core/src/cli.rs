use clap::Parser;

/// Križevci events aggregator CLI arguments.
///
/// Every flag overrides the matching environment variable.
#[derive(Debug, Default, Parser)]
#[command(
    name = "krizevci-events",
    version,
    about = "Aggregates public event listings from several local sources"
)]
pub struct Cli {
    /// Address the HTTP server binds to (BIND_ADDR)
    #[arg(long)]
    pub bind: Option<String>,

    /// How long an aggregated result stays fresh, in seconds (CACHE_TTL_SECONDS)
    #[arg(long)]
    pub cache_ttl: Option<u64>,

    /// Background refresh interval in seconds (REFRESH_INTERVAL_SECONDS)
    #[arg(long)]
    pub refresh_interval: Option<u64>,

    /// Per-request upstream timeout in seconds (FETCH_TIMEOUT_SECONDS)
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// Retries for transient upstream failures (FETCH_RETRIES)
    #[arg(long)]
    pub fetch_retries: Option<u32>,

    /// IANA timezone that defines "today" for the venue (EVENTS_TIMEZONE)
    #[arg(long)]
    pub timezone: Option<String>,
}
