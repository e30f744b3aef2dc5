use std::sync::Arc;
use std::time::Duration;

use model::{decimal::Decimal, period::Period, salary::SalaryRecord};
use moka::future::Cache;

const MAX_PERIODS: u64 = 256;

/// Short-TTL read cache for monthly salary lists and aggregate expense.
/// TTL expiry is the backstop; any mutation for a period must call
/// [`SalaryCache::invalidate`] explicitly.
#[derive(Clone)]
pub struct SalaryCache {
    pub(crate) by_period: Cache<Period, Arc<Vec<SalaryRecord>>>,
    pub(crate) expense: Cache<Period, Decimal>,
}

impl SalaryCache {
    pub fn new(ttl: Duration) -> Self {
        SalaryCache {
            by_period: Cache::builder()
                .max_capacity(MAX_PERIODS)
                .time_to_live(ttl)
                .build(),
            expense: Cache::builder()
                .max_capacity(MAX_PERIODS)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn invalidate(&self, period: Period) {
        self.by_period.invalidate(&period).await;
        self.expense.invalidate(&period).await;
    }
}
