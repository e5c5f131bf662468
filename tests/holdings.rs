//! Holdings book integration tests: upsert_buy, apply_sell, list_for_user.

mod common;

use paper_exchange::error::TradingError;
use paper_exchange::holdings::{apply_sell, get, list_for_user, upsert_buy};
use paper_exchange::persistence::{self, SqlitePool};
use rust_decimal_macros::dec;

use common::new_user;

async fn fresh_pool() -> SqlitePool {
    persistence::connect_in_memory().await.unwrap()
}

#[tokio::test]
async fn upsert_buy_creates_holding() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    let holding = upsert_buy(&mut conn, user_id, "AAPL", 10, dec!(174.50)).await.unwrap();

    assert_eq!(holding.user_id, user_id);
    assert_eq!(holding.symbol, "AAPL");
    assert_eq!(holding.quantity, 10);
    assert_eq!(holding.average_price, dec!(174.50));
}

#[tokio::test]
async fn upsert_buy_weighted_average() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();
    let (q1, p1) = (100u64, dec!(174.50));
    let (q2, p2) = (50u64, dec!(180.25));

    upsert_buy(&mut conn, user_id, "AAPL", q1, p1).await.unwrap();
    let holding = upsert_buy(&mut conn, user_id, "AAPL", q2, p2).await.unwrap();

    let expected = (p1 * rust_decimal::Decimal::from(q1) + p2 * rust_decimal::Decimal::from(q2))
        / rust_decimal::Decimal::from(q1 + q2);
    assert_eq!(holding.quantity, 150);
    assert_eq!(holding.average_price, expected);
}

#[tokio::test]
async fn apply_sell_keeps_average() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    upsert_buy(&mut conn, user_id, "MSFT", 10, dec!(400)).await.unwrap();
    let after = apply_sell(&mut conn, user_id, "MSFT", 4).await.unwrap().unwrap();

    assert_eq!(after.quantity, 6);
    assert_eq!(after.average_price, dec!(400));
}

#[tokio::test]
async fn apply_sell_to_zero_deletes_row() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    upsert_buy(&mut conn, user_id, "MSFT", 10, dec!(400)).await.unwrap();
    let after = apply_sell(&mut conn, user_id, "MSFT", 10).await.unwrap();

    assert!(after.is_none());
    assert!(get(&mut conn, user_id, "MSFT").await.unwrap().is_none());
    assert!(list_for_user(&mut conn, user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn closed_holding_is_recreated_at_new_price() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    upsert_buy(&mut conn, user_id, "IBM", 5, dec!(150)).await.unwrap();
    apply_sell(&mut conn, user_id, "IBM", 5).await.unwrap();
    let holding = upsert_buy(&mut conn, user_id, "IBM", 2, dec!(160)).await.unwrap();

    assert_eq!(holding.quantity, 2);
    assert_eq!(holding.average_price, dec!(160));
}

#[tokio::test]
async fn apply_sell_more_than_held_fails() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    upsert_buy(&mut conn, user_id, "AAPL", 3, dec!(10)).await.unwrap();
    let err = apply_sell(&mut conn, user_id, "AAPL", 4).await.unwrap_err();
    assert!(matches!(
        err,
        TradingError::InsufficientShares { needed: 4, available: 3 }
    ));

    let err = apply_sell(&mut conn, user_id, "GOOGL", 1).await.unwrap_err();
    assert!(matches!(
        err,
        TradingError::InsufficientShares { needed: 1, available: 0 }
    ));
}

#[tokio::test]
async fn list_for_user_is_insertion_ordered_and_per_user() {
    let pool = fresh_pool().await;
    let user_id = new_user(&pool).await;
    let other = new_user(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    upsert_buy(&mut conn, user_id, "MSFT", 1, dec!(1)).await.unwrap();
    upsert_buy(&mut conn, user_id, "AAPL", 1, dec!(1)).await.unwrap();
    upsert_buy(&mut conn, other, "IBM", 1, dec!(1)).await.unwrap();
    // Updating an existing row keeps its place.
    upsert_buy(&mut conn, user_id, "MSFT", 1, dec!(3)).await.unwrap();

    let symbols: Vec<String> = list_for_user(&mut conn, user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.symbol)
        .collect();
    assert_eq!(symbols, vec!["MSFT", "AAPL"]);
    assert_eq!(list_for_user(&mut conn, user_id).await.unwrap(), list_for_user(&mut conn, user_id).await.unwrap());
}
