use std::sync::Arc;

use paper_exchange::api::routes::{app_router, AppState};
use paper_exchange::config::Config;
use paper_exchange::feed::{loader, simulator, MarketDataStore};
use paper_exchange::ledger::Ledger;
use paper_exchange::locks::UserLocks;
use paper_exchange::persistence;
use paper_exchange::trading::TradingService;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_exchange=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let pool = persistence::connect(&config.database_url).await?;

    let market = Arc::new(MarketDataStore::new());
    let summary = loader::load_market_data(&config.market_data_dir, &market)?;
    if market.supported_symbols().is_empty() {
        warn!(
            "No live prices found under {}; every order will fail with SymbolNotFound",
            config.market_data_dir.display()
        );
    }
    let cached = loader::cache_live_series(&pool, &summary.live_series).await?;
    info!(
        "Market data loaded: {} historical, {} live points ({} cached), {} news dates",
        summary.historical_points, summary.live_points, cached, summary.news_dates
    );

    let trading = TradingService::new(
        pool.clone(),
        market.clone(),
        Ledger::new(config.starting_cash),
        Arc::new(UserLocks::new(config.settlement_timeout)),
    );
    simulator::spawn_price_simulation(
        market.clone(),
        trading.clone(),
        config.tick_interval,
        config.tick_volatility,
    );

    let app_state = AppState {
        trading,
        market,
        db: pool,
        jwt_secret: Arc::new(config.jwt_secret.clone()),
    };

    let app = app_router(app_state);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());
    axum::serve(listener, app).await?;
    Ok(())
}
