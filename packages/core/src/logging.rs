use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives: our own logs at `info`, chatty transport and HTML
/// parser crates only when they warn.
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,html5ever=warn,selectors=warn";

/// Initialize structured logging for the application.
///
/// This must be called once at startup (in main.rs). `RUST_LOG` replaces
/// the default filter entirely, e.g. `RUST_LOG=krizevci_events=debug`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Logging initialized");
}
