use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;

use super::PriceFeed;
use crate::types::market::{MarketDataPoint, MarketOverviewEntry, NewsItem};
use crate::types::order::Price;

const TICK_CHANNEL_CAPACITY: usize = 1024;
const MAX_NEWS_ITEMS: usize = 50;

/// Published once per symbol on every simulated tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceTick {
    pub symbol: String,
    pub price: Price,
    pub timestamp: DateTime<Utc>,
}

/// Process-wide market data. Prices are replaced one key at a time and only
/// handed out by value.
pub struct MarketDataStore {
    prices: DashMap<String, Price>,
    history: DashMap<String, Vec<MarketDataPoint>>,
    news: RwLock<BTreeMap<String, Vec<NewsItem>>>,
    ticks: broadcast::Sender<PriceTick>,
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataStore {
    pub fn new() -> Self {
        let (ticks, _) = broadcast::channel(TICK_CHANNEL_CAPACITY);
        Self {
            prices: DashMap::new(),
            history: DashMap::new(),
            news: RwLock::new(BTreeMap::new()),
            ticks,
        }
    }

    pub fn set_price(&self, symbol: &str, price: Price) {
        self.prices.insert(symbol.to_uppercase(), price);
    }

    /// Set a price and publish it to tick subscribers.
    pub fn publish_price(&self, symbol: &str, price: Price) {
        let symbol = symbol.to_uppercase();
        self.prices.insert(symbol.clone(), price);
        // No subscribers is fine.
        let _ = self.ticks.send(PriceTick {
            symbol,
            price,
            timestamp: Utc::now(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PriceTick> {
        self.ticks.subscribe()
    }

    /// Copy of every (symbol, price) pair, sorted by symbol.
    pub fn snapshot(&self) -> Vec<(String, Price)> {
        let mut prices: Vec<(String, Price)> = self
            .prices
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        prices.sort_by(|a, b| a.0.cmp(&b.0));
        prices
    }

    pub fn supported_symbols(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|(s, _)| s).collect()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.prices.contains_key(&symbol.to_uppercase())
    }

    /// Append bars to a symbol's series.
    pub fn extend_history(&self, symbol: &str, points: Vec<MarketDataPoint>) {
        self.history
            .entry(symbol.to_uppercase())
            .or_default()
            .extend(points);
    }

    /// Series for a symbol; the last `days` bars when given.
    pub fn history(&self, symbol: &str, days: Option<usize>) -> Vec<MarketDataPoint> {
        let Some(series) = self.history.get(&symbol.to_uppercase()) else {
            return Vec::new();
        };
        match days {
            Some(days) => series[series.len().saturating_sub(days)..].to_vec(),
            None => series.clone(),
        }
    }

    pub fn insert_news(&self, date: &str, items: Vec<NewsItem>) {
        if let Ok(mut news) = self.news.write() {
            news.insert(date.to_string(), items);
        }
    }

    /// News for one date, or the newest items across all dates.
    pub fn news(&self, date: Option<&str>) -> Vec<NewsItem> {
        let Ok(news) = self.news.read() else {
            return Vec::new();
        };
        match date {
            Some(date) => news.get(date).cloned().unwrap_or_default(),
            None => news
                .values()
                .rev()
                .flat_map(|items| items.iter().cloned())
                .take(MAX_NEWS_ITEMS)
                .collect(),
        }
    }

    /// Current price of every symbol with its change against the last loaded close.
    pub fn overview(&self) -> Vec<MarketOverviewEntry> {
        self.snapshot()
            .into_iter()
            .map(|(symbol, price)| {
                let last_close = self
                    .history
                    .get(&symbol)
                    .and_then(|series| series.last().map(|p| p.close));
                let (change, change_percent) = match last_close {
                    Some(close) if !close.is_zero() => {
                        let change = price - close;
                        (change, (change / close * Decimal::ONE_HUNDRED).round_dp(2))
                    }
                    _ => (Decimal::ZERO, Decimal::ZERO),
                };
                MarketOverviewEntry {
                    symbol,
                    price,
                    change,
                    change_percent,
                }
            })
            .collect()
    }
}

impl PriceFeed for MarketDataStore {
    fn current_price(&self, symbol: &str) -> Option<Price> {
        self.prices.get(&symbol.to_uppercase()).map(|p| *p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: &str, close: i64) -> MarketDataPoint {
        let close = Decimal::from(close);
        MarketDataPoint {
            timestamp: ts.to_string(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
        }
    }

    #[test]
    fn history_returns_tail_when_days_given() {
        let store = MarketDataStore::new();
        store.extend_history("ibm", vec![bar("1", 1), bar("2", 2), bar("3", 3)]);
        let tail = store.history("IBM", Some(2));
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].timestamp, "2");
        assert_eq!(store.history("IBM", Some(10)).len(), 3);
        assert!(store.history("MSFT", None).is_empty());
    }

    #[test]
    fn overview_reports_change_from_last_close() {
        let store = MarketDataStore::new();
        store.extend_history("MSFT", vec![bar("1", 200)]);
        store.set_price("MSFT", Decimal::from(210));
        let overview = store.overview();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].change, Decimal::from(10));
        assert_eq!(overview[0].change_percent, Decimal::from(5));
    }

    #[test]
    fn publish_reaches_subscribers() {
        let store = MarketDataStore::new();
        let mut rx = store.subscribe();
        store.publish_price("aapl", Decimal::from(5));
        let tick = rx.try_recv().unwrap();
        assert_eq!(tick.symbol, "AAPL");
        assert_eq!(store.current_price("AAPL"), Some(Decimal::from(5)));
    }
}
