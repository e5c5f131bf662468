//! Loads the historical series, live series and news files into a
//! [`MarketDataStore`]. Missing files are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::MarketDataStore;
use crate::persistence;
use crate::types::market::{MarketDataPoint, NewsItem};

const HISTORICAL_DIR: &str = "simulation_historical_data";
const LIVE_DIR: &str = "simulation_price_data_July_1-Aug_30";
const NEWS_DIR: &str = "simulation_news_data_July_1-Aug_30";

const HISTORICAL_SYMBOLS: [&str; 4] = ["AAPL", "GOOGL", "MSFT", "IBM"];
const LIVE_SYMBOLS: [&str; 4] = ["AAPL", "GOOG", "MSFT", "IBM"];
const NEWS_FILES: [&str; 2] = [
    "simulated_July_news_2025.json",
    "simulated_August_news_2025.json",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("parsing news file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// What a load pass found, per kind of file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub historical_points: usize,
    pub live_points: usize,
    pub news_dates: usize,
    /// Live series per symbol, kept for the market data cache.
    pub live_series: Vec<(String, Vec<MarketDataPoint>)>,
}

fn historical_file(symbol: &str) -> String {
    if symbol == "AAPL" {
        "simulated_AAPL_2025_historical.csv".to_string()
    } else {
        format!("{}_2025_historical.csv", symbol)
    }
}

/// The live GOOG file feeds the GOOGL series.
fn live_symbol_key(symbol: &str) -> &str {
    if symbol == "GOOG" { "GOOGL" } else { symbol }
}

/// Load every known file under `dir`. The current price of each symbol is the
/// close of its last live bar.
pub fn load_market_data(dir: &Path, store: &MarketDataStore) -> Result<LoadSummary, LoadError> {
    let mut summary = LoadSummary::default();

    for symbol in HISTORICAL_SYMBOLS {
        let path = dir.join(HISTORICAL_DIR).join(historical_file(symbol));
        let Some(points) = read_series(&path)? else {
            continue;
        };
        info!("Loaded {} historical data points for {}", points.len(), symbol);
        summary.historical_points += points.len();
        store.extend_history(symbol, points);
    }

    for symbol in LIVE_SYMBOLS {
        let path = dir.join(LIVE_DIR).join(format!("simulated_{}_live.csv", symbol));
        let Some(points) = read_series(&path)? else {
            continue;
        };
        let key = live_symbol_key(symbol);
        if let Some(last) = points.last() {
            store.set_price(key, last.close);
        }
        info!("Loaded {} live data points for {}", points.len(), key);
        summary.live_points += points.len();
        summary.live_series.push((key.to_string(), points.clone()));
        store.extend_history(key, points);
    }

    for file in NEWS_FILES {
        let path = dir.join(NEWS_DIR).join(file);
        if !path.exists() {
            debug!("News file {} not present, skipping", path.display());
            continue;
        }
        let raw = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        match parse_news(&raw) {
            Ok(by_date) => {
                summary.news_dates += by_date.len();
                for (date, items) in by_date {
                    store.insert_news(&date, items);
                }
                info!("Loaded news data from {}", file);
            }
            // A bad news file should not stop the server.
            Err(source) => warn!("{}", LoadError::Json { path, source }),
        }
    }

    Ok(summary)
}

fn read_series(path: &Path) -> Result<Option<Vec<MarketDataPoint>>, LoadError> {
    if !path.exists() {
        debug!("Series file {} not present, skipping", path.display());
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&raw).map(Some)
}

/// Parse an OHLCV CSV with a header row naming
/// `timestamp,open,high,low,close,volume` in any order.
pub fn parse_csv(raw: &str) -> Result<Vec<MarketDataPoint>, LoadError> {
    let mut lines = raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let index_of = |name: &str| {
        columns.iter().position(|c| c == name).ok_or_else(|| LoadError::Csv {
            line: 1,
            message: format!("missing column {}", name),
        })
    };
    let ts = index_of("timestamp")?;
    let open = index_of("open")?;
    let high = index_of("high")?;
    let low = index_of("low")?;
    let close = index_of("close")?;
    let volume = index_of("volume")?;

    let mut points = Vec::new();
    for (i, line) in lines {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize| {
            fields.get(idx).copied().ok_or_else(|| LoadError::Csv {
                line: line_no,
                message: format!("expected {} fields, got {}", columns.len(), fields.len()),
            })
        };
        let decimal = |idx: usize| -> Result<Decimal, LoadError> {
            let raw = field(idx)?;
            raw.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(raw))
                .map_err(|e| LoadError::Csv {
                    line: line_no,
                    message: format!("bad number {:?}: {}", raw, e),
                })
        };
        let raw_volume = field(volume)?;
        // Volumes are sometimes written as floats.
        let volume = raw_volume
            .parse::<u64>()
            .or_else(|_| raw_volume.parse::<f64>().map(|v| v.max(0.0) as u64))
            .map_err(|e| LoadError::Csv {
                line: line_no,
                message: format!("bad volume {:?}: {}", raw_volume, e),
            })?;
        points.push(MarketDataPoint {
            timestamp: field(ts)?.to_string(),
            open: decimal(open)?,
            high: decimal(high)?,
            low: decimal(low)?,
            close: decimal(close)?,
            volume,
        });
    }
    Ok(points)
}

/// News files map a date to the list of items published that day.
pub fn parse_news(raw: &str) -> Result<BTreeMap<String, Vec<NewsItem>>, serde_json::Error> {
    let value: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    let mut by_date = BTreeMap::new();
    for (date, items) in value {
        if items.is_array() {
            by_date.insert(date, serde_json::from_value(items)?);
        }
    }
    Ok(by_date)
}

/// Write loaded live bars into the market data cache in one transaction.
pub async fn cache_live_series(
    pool: &SqlitePool,
    series: &[(String, Vec<MarketDataPoint>)],
) -> Result<usize, sqlx::Error> {
    let mut tx = persistence::begin_write(pool).await?;
    let mut written = 0;
    for (symbol, points) in series {
        for point in points {
            persistence::upsert_market_data(&mut *tx, symbol, point).await?;
            written += 1;
        }
    }
    tx.commit().await?;
    Ok(written)
}
