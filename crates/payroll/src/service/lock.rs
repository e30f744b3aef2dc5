use std::collections::HashMap;
use std::sync::Arc;

use model::period::Period;
use parking_lot::Mutex;
use tokio::sync::{Mutex as PeriodMutex, OwnedMutexGuard};

/// Registry entries for completed periods are pruned once the map grows past
/// this size. Dropping an idle lock is safe: the salary-record existence
/// check is the cross-process source of truth for "already generated".
const PRUNE_THRESHOLD: usize = 64;

/// Keyed mutex service guarding "has period X been generated" in-process.
/// Locks for distinct periods are fully independent; the tokio mutex hands
/// the lock to waiters in FIFO order.
#[derive(Default)]
pub struct PeriodLocks {
    locks: Mutex<HashMap<Period, Arc<PeriodMutex<()>>>>,
}

impl PeriodLocks {
    /// Blocks until the calling task exclusively owns the period. The guard
    /// releases on drop, including on panic and early return.
    pub async fn acquire(&self, period: Period) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(period).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    fn period(token: &str) -> Period {
        token.parse().unwrap()
    }

    #[tokio::test]
    async fn test_same_period_is_exclusive() {
        let locks = PeriodLocks::default();
        let _guard = locks.acquire(period("2024-01")).await;

        let second = timeout(Duration::from_millis(50), locks.acquire(period("2024-01"))).await;
        assert!(second.is_err(), "second acquire must block");
    }

    #[tokio::test]
    async fn test_distinct_periods_are_independent() {
        let locks = PeriodLocks::default();
        let _guard = locks.acquire(period("2024-01")).await;

        let other = timeout(Duration::from_millis(50), locks.acquire(period("2024-02"))).await;
        assert!(other.is_ok(), "a lock for 2024-01 must not block 2024-02");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_exactly_one_winner() {
        let locks = Arc::new(PeriodLocks::default());
        let generated = Arc::new(AtomicBool::new(false));
        let successes = Arc::new(AtomicUsize::new(0));
        let conflicts = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let generated = generated.clone();
            let successes = successes.clone();
            let conflicts = conflicts.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(period("2024-03")).await;
                // Double-check under the lock, as the orchestrator does
                // against the record store.
                if generated.load(Ordering::SeqCst) {
                    conflicts.fetch_add(1, Ordering::SeqCst);
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                generated.store(true, Ordering::SeqCst);
                successes.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(1, successes.load(Ordering::SeqCst));
        assert_eq!(15, conflicts.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_registry_is_pruned() {
        let locks = PeriodLocks::default();
        for year in 2020..2026 {
            for month in 1..=12 {
                let period = Period::new(year, month).unwrap();
                drop(locks.acquire(period).await);
            }
        }
        assert!(
            locks.len() <= PRUNE_THRESHOLD + 1,
            "registry grew to {}",
            locks.len()
        );
    }
}
