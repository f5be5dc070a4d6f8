use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub cache_ttl: Duration,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
    pub fetch_retries: u32,
    pub timezone: Tz,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CACHE_TTL_SECONDS: u64 = 900;
const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 900;
const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_FETCH_RETRIES: u32 = 2;
const DEFAULT_TIMEZONE: &str = "Europe/Zagreb";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let bind_addr = parse_bind_addr(
            &lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let cache_ttl = seconds(&lookup, "CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS)?;
        let refresh_interval =
            seconds(&lookup, "REFRESH_INTERVAL_SECONDS", DEFAULT_REFRESH_INTERVAL_SECONDS)?;
        let fetch_timeout = seconds(&lookup, "FETCH_TIMEOUT_SECONDS", DEFAULT_FETCH_TIMEOUT_SECONDS)?;

        let fetch_retries = match lookup("FETCH_RETRIES") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| "FETCH_RETRIES must be a valid number")?,
            None => DEFAULT_FETCH_RETRIES,
        };

        let timezone = parse_timezone(
            &lookup("EVENTS_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        )?;

        let config = Self {
            bind_addr,
            cache_ttl,
            refresh_interval,
            fetch_timeout,
            fetch_retries,
            timezone,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI flags on top of the environment values.
    pub fn with_cli(mut self, cli: &Cli) -> Result<Self, String> {
        if let Some(bind) = &cli.bind {
            self.bind_addr = parse_bind_addr(bind)?;
        }
        if let Some(secs) = cli.cache_ttl {
            self.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.refresh_interval {
            self.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.fetch_timeout {
            self.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = cli.fetch_retries {
            self.fetch_retries = retries;
        }
        if let Some(timezone) = &cli.timezone {
            self.timezone = parse_timezone(timezone)?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.cache_ttl.is_zero() {
            return Err("CACHE_TTL_SECONDS must be greater than zero".into());
        }
        if self.refresh_interval < self.cache_ttl {
            return Err(format!(
                "REFRESH_INTERVAL_SECONDS ({}) must not be shorter than CACHE_TTL_SECONDS ({})",
                self.refresh_interval.as_secs(),
                self.cache_ttl.as_secs()
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err("FETCH_TIMEOUT_SECONDS must be greater than zero".into());
        }
        Ok(())
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, String> {
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("{} must be a valid number", key))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

fn parse_bind_addr(raw: &str) -> Result<SocketAddr, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("Invalid BIND_ADDR: {}", raw))
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| format!("Invalid EVENTS_TIMEZONE: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.cache_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_interval, Duration::from_secs(900));
        assert_eq!(config.fetch_retries, 2);
        assert_eq!(config.timezone, chrono_tz::Europe::Zagreb);
    }

    #[test]
    fn env_values_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("CACHE_TTL_SECONDS", "60"),
            ("REFRESH_INTERVAL_SECONDS", "90"),
            ("FETCH_TIMEOUT_SECONDS", "5"),
            ("FETCH_RETRIES", "0"),
            ("EVENTS_TIMEZONE", "UTC"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_interval, Duration::from_secs(90));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.fetch_retries, 0);
        assert_eq!(config.timezone, chrono_tz::UTC);
    }

    #[test]
    fn refresh_interval_shorter_than_ttl_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("CACHE_TTL_SECONDS", "600"),
            ("REFRESH_INTERVAL_SECONDS", "300"),
        ]))
        .unwrap_err();

        assert!(err.contains("REFRESH_INTERVAL_SECONDS"));
    }

    #[test]
    fn invalid_values_are_reported_by_key() {
        let err = Config::from_lookup(lookup(&[("CACHE_TTL_SECONDS", "soon")])).unwrap_err();
        assert!(err.contains("CACHE_TTL_SECONDS"));

        let err = Config::from_lookup(lookup(&[("EVENTS_TIMEZONE", "Europe/Krizevci")])).unwrap_err();
        assert!(err.contains("EVENTS_TIMEZONE"));
    }

    #[test]
    fn cli_flags_override_env() {
        let cli = Cli {
            cache_ttl: Some(30),
            refresh_interval: Some(45),
            timezone: Some("Europe/Vienna".into()),
            ..Cli::default()
        };

        let config = Config::from_lookup(lookup(&[])).unwrap().with_cli(&cli).unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.refresh_interval, Duration::from_secs(45));
        assert_eq!(config.timezone, chrono_tz::Europe::Vienna);
    }
}
