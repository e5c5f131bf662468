//! Market data loading from a directory laid out like the shipped data set.

use std::fs;
use std::path::Path;

use paper_exchange::feed::MarketDataStore;
use paper_exchange::feed::PriceFeed;
use paper_exchange::feed::loader::{LoadError, cache_live_series, load_market_data};
use paper_exchange::persistence;
use rust_decimal_macros::dec;

const HEADER: &str = "timestamp,open,high,low,close,volume";

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn seed(dir: &Path) {
    write(
        dir,
        "simulation_historical_data/simulated_AAPL_2025_historical.csv",
        &format!("{HEADER}\n2025-06-27,170,172,169,171.00,1000\n2025-06-30,171,173,170,172.00,1100\n"),
    );
    write(
        dir,
        "simulation_price_data_July_1-Aug_30/simulated_AAPL_live.csv",
        &format!("{HEADER}\n2025-07-01 09:30,172,175,171,173.25,900\n2025-07-01 09:31,173,176,172,174.50,950\n"),
    );
    write(
        dir,
        "simulation_price_data_July_1-Aug_30/simulated_GOOG_live.csv",
        &format!("{HEADER}\n2025-07-01 09:30,180,181,179,180.10,500\n"),
    );
    write(
        dir,
        "simulation_news_data_July_1-Aug_30/simulated_July_news_2025.json",
        r#"{
            "2025-07-01": [{"title": "Markets open higher", "time_published": "2025-07-01T09:00:00"}],
            "2025-07-02": [{"title": "Tech rally", "time_published": "2025-07-02T09:00:00", "sentiment": "positive"}],
            "meta": "ignored"
        }"#,
    );
}

#[test]
fn loads_prices_history_and_news() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let store = MarketDataStore::new();

    let summary = load_market_data(dir.path(), &store).unwrap();

    assert_eq!(summary.historical_points, 2);
    assert_eq!(summary.live_points, 3);
    assert_eq!(summary.news_dates, 2);

    // Current price is the close of the last live bar.
    assert_eq!(store.current_price("AAPL"), Some(dec!(174.50)));
    // The GOOG live file is served as GOOGL.
    assert_eq!(store.current_price("GOOGL"), Some(dec!(180.10)));
    assert_eq!(store.current_price("GOOG"), None);
    assert_eq!(store.supported_symbols(), vec!["AAPL", "GOOGL"]);

    let history = store.history("AAPL", None);
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].timestamp, "2025-06-27");
    assert_eq!(store.history("aapl", Some(1))[0].close, dec!(174.50));

    let latest = store.news(None);
    assert_eq!(latest[0].title, "Tech rally");
    assert_eq!(store.news(Some("2025-07-01")).len(), 1);
    assert!(store.news(Some("2025-08-01")).is_empty());
}

#[test]
fn missing_directory_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = MarketDataStore::new();

    let summary = load_market_data(&dir.path().join("absent"), &store).unwrap();

    assert_eq!(summary.historical_points, 0);
    assert_eq!(summary.live_points, 0);
    assert!(store.supported_symbols().is_empty());
}

#[test]
fn malformed_series_is_reported_with_its_line() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "simulation_price_data_July_1-Aug_30/simulated_MSFT_live.csv",
        &format!("{HEADER}\n2025-07-01 09:30,400,401,399,400.00,10\n2025-07-01 09:31,400,401,oops,400.50,12\n"),
    );
    let store = MarketDataStore::new();

    let err = load_market_data(dir.path(), &store).unwrap_err();
    assert!(matches!(err, LoadError::Csv { line: 3, .. }));
}

#[tokio::test]
async fn live_series_is_written_to_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let store = MarketDataStore::new();
    let summary = load_market_data(dir.path(), &store).unwrap();
    let pool = persistence::connect_in_memory().await.unwrap();

    let written = cache_live_series(&pool, &summary.live_series).await.unwrap();
    assert_eq!(written, 3);

    // Reloading the same bars upserts rather than duplicating.
    cache_live_series(&pool, &summary.live_series).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM market_data_cache")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);
}
