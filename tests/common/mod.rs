use chrono::Utc;
use paper_exchange::persistence::{self, SqlitePool};
use uuid::Uuid;

/// Insert a user row for ledgers, holdings and orders to reference.
pub async fn new_user(pool: &SqlitePool) -> Uuid {
    let id = Uuid::new_v4();
    let username = format!("user-{}", id.simple());
    let email = format!("{}@example.com", username);
    persistence::insert_user(pool, id, &username, &email, "unused-hash", Utc::now())
        .await
        .unwrap();
    id
}
