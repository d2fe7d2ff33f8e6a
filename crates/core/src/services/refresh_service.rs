use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex, Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::models::holding::Holding;
use crate::models::summary::PortfolioSnapshot;
use crate::services::quote_service::QuoteService;
use crate::services::valuation_service::{quotes_by_name, ValuationService};

/// Upper bound on fresh snapshots kept at once; the oldest is evicted first.
pub const MAX_CACHED_SNAPSHOTS: usize = 32;

/// Cache key for a set of requested names: trimmed, sorted, comma-joined.
pub fn fingerprint(names: &[String]) -> String {
    let mut sorted: Vec<&str> = names.iter().map(|n| n.trim()).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

struct CacheEntry {
    snapshot: Arc<PortfolioSnapshot>,
    /// When the refresh that produced this entry began fetching.
    started_at: Instant,
    fetched_at: Instant,
}

/// Owns the fetch → aggregate cycle and its transient results.
///
/// Cache strategy:
/// - Entries are keyed by [`fingerprint`] of the requested names.
/// - An entry is served until it is older than `stale_after`, or until it
///   is removed with [`invalidate`](Self::invalidate) / [`invalidate_all`](Self::invalidate_all).
/// - Expired entries are dropped on every store, and at most
///   [`MAX_CACHED_SNAPSHOTS`] are kept.
/// - Refreshes of the same fingerprint are serialized; a caller that waited
///   on another refresh reuses its result instead of aggregating again.
///   Different fingerprints refresh independently.
/// - A manual [`force_refresh`](Self::force_refresh) abandons an in-flight
///   scheduled refresh and resets the schedule.
pub struct RefreshController {
    holdings: Vec<Holding>,
    quote_service: Arc<QuoteService>,
    valuation_service: ValuationService,
    stale_after: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
    refresh_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    trigger: Notify,
}

impl RefreshController {
    pub fn new(holdings: Vec<Holding>, quote_service: Arc<QuoteService>, stale_after: Duration) -> Self {
        Self {
            holdings,
            quote_service,
            valuation_service: ValuationService::new(),
            stale_after,
            cache: RwLock::new(HashMap::new()),
            refresh_locks: StdMutex::new(HashMap::new()),
            trigger: Notify::new(),
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// A cached snapshot for `names`, if one exists and is still fresh.
    pub fn cached(&self, names: &[String]) -> Option<Arc<PortfolioSnapshot>> {
        self.fresh_entry(&fingerprint(names))
    }

    /// Serve from cache when fresh; otherwise fetch and aggregate.
    pub async fn get_or_refresh(&self, names: &[String]) -> Arc<PortfolioSnapshot> {
        let key = fingerprint(names);
        if let Some(snapshot) = self.fresh_entry(&key) {
            return snapshot;
        }

        let _permit = self.acquire(&key).await;
        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh_entry(&key) {
            return snapshot;
        }
        self.refresh_locked(&key, names).await
    }

    /// Refresh now, superseding any scheduled refresh in progress.
    pub async fn force_refresh(&self, names: &[String]) -> Arc<PortfolioSnapshot> {
        let requested_at = Instant::now();
        let key = fingerprint(names);
        self.remove(&key);
        self.trigger.notify_one();

        let _permit = self.acquire(&key).await;
        // A refresh that started after this request already covers it.
        if let Some(snapshot) = self.entry_started_since(&key, requested_at) {
            return snapshot;
        }
        self.refresh_locked(&key, names).await
    }

    /// Drop the cached snapshot for `names`.
    pub fn invalidate(&self, names: &[String]) {
        self.remove(&fingerprint(names));
    }

    /// Drop every cached snapshot.
    pub fn invalidate_all(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Number of cached fingerprints (fresh or stale).
    pub fn cache_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Start a background task refreshing `names` every `period`.
    ///
    /// The first tick fires immediately. A `force_refresh` while a tick is
    /// being processed cancels that tick's work and restarts the period.
    pub fn spawn_scheduler(self: &Arc<Self>, names: Vec<String>, period: Duration) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let controller = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Refresh scheduler started ({} s period)", period.as_secs());

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = controller.trigger.notified() => ticker.reset(),
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = controller.get_or_refresh(&names) => {}
                            _ = controller.trigger.notified() => {
                                debug!("Scheduled refresh superseded by manual refresh");
                                ticker.reset();
                            }
                            _ = shutdown_rx.changed() => break,
                        }
                    }
                }
            }
            info!("Refresh scheduler stopped");
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn refresh_locked(&self, key: &str, names: &[String]) -> Arc<PortfolioSnapshot> {
        let started_at = Instant::now();
        // All outcomes are collected before aggregation; a dropped future stores nothing.
        let outcomes = self.quote_service.fetch_quotes(names).await;
        let snapshot = Arc::new(
            self.valuation_service
                .aggregate(&self.holdings, &quotes_by_name(outcomes)),
        );

        self.store(
            key,
            CacheEntry {
                snapshot: Arc::clone(&snapshot),
                started_at,
                fetched_at: Instant::now(),
            },
        );
        debug!("Refreshed snapshot for [{key}]");
        snapshot
    }

    fn store(&self, key: &str, entry: CacheEntry) {
        let Ok(mut cache) = self.cache.write() else {
            return;
        };
        let stale_after = self.stale_after;
        cache.retain(|_, e| e.fetched_at.elapsed() < stale_after);

        if !cache.contains_key(key) && cache.len() >= MAX_CACHED_SNAPSHOTS {
            let oldest = cache
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting cached snapshot for [{oldest}]");
                cache.remove(&oldest);
            }
        }
        cache.insert(key.to_string(), entry);
    }

    /// Wait for the refresh lock of one fingerprint.
    async fn acquire(&self, key: &str) -> RefreshPermit<'_> {
        let lock = match self.refresh_locks.lock() {
            Ok(mut locks) => Arc::clone(locks.entry(key.to_string()).or_default()),
            Err(_) => Arc::new(Mutex::new(())),
        };
        RefreshPermit {
            guard: Some(lock.lock_owned().await),
            locks: &self.refresh_locks,
            key: key.to_string(),
        }
    }

    fn fresh_entry(&self, key: &str) -> Option<Arc<PortfolioSnapshot>> {
        let cache = self.cache.read().ok()?;
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_after)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    fn entry_started_since(&self, key: &str, since: Instant) -> Option<Arc<PortfolioSnapshot>> {
        let cache = self.cache.read().ok()?;
        cache
            .get(key)
            .filter(|entry| entry.started_at >= since)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    fn remove(&self, key: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(key);
        }
    }
}

/// Held while refreshing one fingerprint. The lock is removed from the
/// map once no other caller holds or waits on it.
struct RefreshPermit<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    key: String,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Ok(mut locks) = self.locks.lock() {
            if locks.get(&self.key).is_some_and(|l| Arc::strong_count(l) == 1) {
                locks.remove(&self.key);
            }
        }
    }
}

/// Handle to a running refresh scheduler. Dropping it also stops the task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
