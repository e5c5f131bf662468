//! Per-user settlement locks with a bounded wait.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::TradingError;

/// Serializes everything that reads and then writes one user's ledger and
/// holdings. Locks are created on first use and kept for the process lifetime.
pub struct UserLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl UserLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Wait for the user's lock, failing with `SettlementTimeout` after the
    /// configured bound.
    pub async fn acquire(&self, user_id: Uuid) -> Result<OwnedMutexGuard<()>, TradingError> {
        let lock = self.locks.entry(user_id).or_default().clone();
        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| TradingError::SettlementTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_times_out_while_held() {
        let locks = UserLocks::new(Duration::from_millis(20));
        let user = Uuid::new_v4();
        let _held = locks.acquire(user).await.unwrap();
        let err = locks.acquire(user).await.unwrap_err();
        assert!(matches!(err, TradingError::SettlementTimeout));
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let locks = UserLocks::new(Duration::from_millis(20));
        let _a = locks.acquire(Uuid::new_v4()).await.unwrap();
        assert!(locks.acquire(Uuid::new_v4()).await.is_ok());
    }
}
