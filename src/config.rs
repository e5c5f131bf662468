use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::warn;

const DEV_JWT_SECRET: &str = "paper-exchange-dev-secret";

/// Server configuration, read from the environment with defaults for every field.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// sqlx SQLite connection URL.
    pub database_url: String,
    /// HMAC secret for bearer tokens.
    pub jwt_secret: Vec<u8>,
    /// Root directory of the CSV/JSON market data files.
    pub market_data_dir: PathBuf,
    /// Cash balance given to a newly created ledger.
    pub starting_cash: Decimal,
    /// Interval between simulated price ticks.
    pub tick_interval: Duration,
    /// Width of the random-walk band applied on each tick (0.02 = +/-1%).
    pub tick_volatility: f64,
    /// Longest wait for a user's settlement lock.
    pub settlement_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite://paper_exchange.db?mode=rwc".to_string(),
            jwt_secret: DEV_JWT_SECRET.as_bytes().to_vec(),
            market_data_dir: PathBuf::from("data"),
            starting_cash: Decimal::new(100_000_00, 2),
            tick_interval: Duration::from_secs(30),
            tick_volatility: 0.02,
            settlement_timeout: Duration::from_millis(5_000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s.into_bytes(),
            _ => {
                warn!("JWT_SECRET not set, using development secret");
                defaults.jwt_secret
            }
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            market_data_dir: env::var("MARKET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.market_data_dir),
            starting_cash: parse_var("STARTING_CASH").unwrap_or(defaults.starting_cash),
            tick_interval: positive("TICK_INTERVAL_SECS", parse_var("TICK_INTERVAL_SECS"))
                .map(Duration::from_secs)
                .unwrap_or(defaults.tick_interval),
            tick_volatility: parse_var("TICK_VOLATILITY").unwrap_or(defaults.tick_volatility),
            settlement_timeout: parse_var("SETTLEMENT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.settlement_timeout),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparsable {}={}", name, raw);
            None
        }
    }
}

/// Drops a zero value, which would stop an interval timer.
fn positive(name: &str, value: Option<u64>) -> Option<u64> {
    match value {
        Some(0) => {
            warn!("Ignoring {}=0, it must be positive", name);
            None
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.starting_cash.to_string(), "100000.00");
        assert_eq!(config.tick_interval, Duration::from_secs(30));
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn zero_tick_interval_falls_back_to_default() {
        assert_eq!(positive("TICK_INTERVAL_SECS", Some(0)), None);
        assert_eq!(positive("TICK_INTERVAL_SECS", Some(5)), Some(5));
        assert_eq!(positive("TICK_INTERVAL_SECS", None), None);
    }
}
