//! Monthly quota reset scheduler
//!
//! A single background task that sleeps until the next billing-period
//! boundary (00:00 UTC on the first of the month) and zeroes every usage
//! counter. The schedule is absolute: each boundary is derived from the
//! previous one, and a failed reset is not retried before the next.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::quota::{current_period_start, next_period_start};
use crate::domain::{CredentialStore, DomainError};
use crate::infrastructure::observability::record_quota_reset;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Background task resetting quota usage at each period boundary
pub struct QuotaResetScheduler {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for QuotaResetScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaResetScheduler").finish_non_exhaustive()
    }
}

impl QuotaResetScheduler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a custom time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the loop on a tokio task until `cancel` fires
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        let now = self.clock.now();
        let mut boundary = next_period_start(now);
        info!(
            period_start = %current_period_start(now),
            next_reset = %boundary,
            "Quota reset scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Quota reset scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(self.until(boundary)) => {}
            }

            let now = self.clock.now();
            if now < boundary {
                continue;
            }

            // Errors are logged and counted inside; the loop always moves on.
            let _ = self.reset_once().await;

            boundary = next_period_start(boundary.max(now));
            info!(next_reset = %boundary, "Next quota reset scheduled");
        }
    }

    /// Zero every usage counter now
    pub async fn reset_once(&self) -> Result<u64, DomainError> {
        let result = self.store.reset_all_usage().await;

        match &result {
            Ok(reset_count) => info!(reset_count, "Quota usage reset"),
            Err(e) => error!(error = %e, "Quota usage reset failed"),
        }
        record_quota_reset(&result);

        result
    }

    fn until(&self, deadline: DateTime<Utc>) -> Duration {
        (deadline - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use crate::config::EncryptionConfig;
    use crate::domain::{AccountId, CredentialSecret, MockCredentialStore};
    use crate::infrastructure::credential::InMemoryCredentialStore;
    use crate::infrastructure::crypto::SecretCipher;

    /// Wall clock that advances with tokio's (paused) time
    struct PausedClock {
        origin: DateTime<Utc>,
        started: tokio::time::Instant,
    }

    impl PausedClock {
        fn starting_at(origin: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self {
                origin,
                started: tokio::time::Instant::now(),
            })
        }
    }

    impl Clock for PausedClock {
        fn now(&self) -> DateTime<Utc> {
            self.origin + chrono::Duration::from_std(self.started.elapsed()).unwrap()
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    async fn store_with_usage() -> (Arc<dyn CredentialStore>, CredentialSecret) {
        let cipher = SecretCipher::new(&EncryptionConfig::new("scheduler-key")).unwrap();
        let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new(cipher));
        let secret = CredentialSecret::new("feedface");

        store
            .insert(&AccountId::new("acme").unwrap(), &secret, 10)
            .await
            .unwrap();
        for _ in 0..4 {
            store.try_consume(&secret).await.unwrap();
        }

        (store, secret)
    }

    async fn usage(store: &Arc<dyn CredentialStore>, secret: &CredentialSecret) -> u64 {
        store.find_by_secret(secret).await.unwrap().unwrap().quota_usage()
    }

    fn counting_store(calls: Arc<AtomicUsize>, fail_first: bool) -> MockCredentialStore {
        let mut store = MockCredentialStore::new();
        store.expect_reset_all_usage().returning(move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            if fail_first && call == 0 {
                Err(DomainError::store_unavailable("connection refused"))
            } else {
                Ok(1)
            }
        });
        store
    }

    #[tokio::test(start_paused = true)]
    async fn test_resets_at_month_boundary() {
        let (store, secret) = store_with_usage().await;
        let clock = PausedClock::starting_at(utc(2026, 1, 31, 23, 59, 59));
        let cancel = CancellationToken::new();

        let handle = QuotaResetScheduler::new(Arc::clone(&store))
            .with_clock(clock)
            .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(usage(&store, &secret).await, 4);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(usage(&store, &secret).await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_reset_mid_month() {
        let (store, secret) = store_with_usage().await;
        let clock = PausedClock::starting_at(utc(2026, 3, 15, 12, 0, 0));
        let cancel = CancellationToken::new();

        let handle = QuotaResetScheduler::new(Arc::clone(&store))
            .with_clock(clock)
            .spawn(cancel.clone());

        // 2026-03-31 11:00 UTC
        tokio::time::sleep(Duration::from_secs(16 * 24 * 3600 - 3600)).await;
        assert_eq!(usage(&store, &secret).await, 4);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_month() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = counting_store(Arc::clone(&calls), false);
        let clock = PausedClock::starting_at(utc(2026, 1, 15, 0, 0, 0));
        let cancel = CancellationToken::new();

        let handle = QuotaResetScheduler::new(Arc::new(store))
            .with_clock(clock)
            .spawn(cancel.clone());

        // Through 2026-04-15: boundaries on Feb 1, Mar 1 and Apr 1
        tokio::time::sleep(Duration::from_secs(90 * 24 * 3600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reset_does_not_stop_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = counting_store(Arc::clone(&calls), true);
        let clock = PausedClock::starting_at(utc(2026, 1, 31, 23, 0, 0));
        let cancel = CancellationToken::new();

        let handle = QuotaResetScheduler::new(Arc::new(store))
            .with_clock(clock)
            .spawn(cancel.clone());

        // Failure on Feb 1 is not retried until Mar 1
        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(27 * 24 * 3600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_before_boundary() {
        let mut store = MockCredentialStore::new();
        store.expect_reset_all_usage().never();
        let clock = PausedClock::starting_at(utc(2026, 6, 10, 0, 0, 0));
        let cancel = CancellationToken::new();

        let handle = QuotaResetScheduler::new(Arc::new(store))
            .with_clock(clock)
            .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_once_reports_rows() {
        let (store, secret) = store_with_usage().await;
        let scheduler = QuotaResetScheduler::new(Arc::clone(&store));

        assert_eq!(scheduler.reset_once().await.unwrap(), 1);
        assert_eq!(usage(&store, &secret).await, 0);
        assert_eq!(scheduler.reset_once().await.unwrap(), 0);
    }

    #[test]
    fn test_system_clock_is_current() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
