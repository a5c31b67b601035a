//! In-memory TTL cache in front of the project source
//!
//! Provides a `ProjectCache` holding a single snapshot of project records with
//! an expiry timestamp. Expiry is evaluated lazily on each request; concurrent
//! misses are collapsed into one upstream fetch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::data::{FetchError, ProjectRecord, ProjectSource};

/// A stored, shareable list of project records
pub type Snapshot = Arc<[ProjectRecord]>;

/// Whether a request was served from the cache or triggered a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Header value for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of the cached snapshot at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing has been fetched successfully yet
    Empty,
    /// A snapshot exists and has not expired
    Fresh,
    /// A snapshot exists but has expired
    Stale,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct CachedProjects {
    /// The snapshot served for this request
    pub projects: Snapshot,
    /// Whether it came from the cache
    pub status: CacheStatus,
}

/// Hit and miss counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Snapshot together with the instant it stops being fresh
#[derive(Debug, Clone)]
struct CacheEntry {
    projects: Snapshot,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Single-slot TTL cache for the project list
///
/// The snapshot and its expiry are replaced together under a write lock, so
/// readers never observe one without the other. Refreshes are serialized by a
/// separate gate held across check, fetch and store; callers queued on the
/// gate while a refresh fails receive that refresh's error instead of
/// fetching again.
pub struct ProjectCache {
    /// Upstream the cache refreshes from
    source: Arc<dyn ProjectSource>,
    /// How long a snapshot stays fresh
    ttl: Duration,
    /// Current snapshot, `None` until the first successful fetch
    entry: RwLock<Option<CacheEntry>>,
    /// Held by the single caller allowed to refresh; holds the error of the
    /// last completed refresh, `None` if it succeeded
    refresh: Mutex<Option<FetchError>>,
    /// Completed refresh attempts, successful or not
    refreshes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for ProjectCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ProjectCache {
    /// Creates an empty cache over the given source
    pub fn new(source: Arc<dyn ProjectSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            refresh: Mutex::new(None),
            refreshes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the project list as of the current wall-clock time
    pub async fn get(&self) -> Result<CachedProjects, FetchError> {
        self.get_at(Utc::now()).await
    }

    /// Returns the project list as of `now`
    ///
    /// Serves the stored snapshot when `now` is before its expiry. Otherwise
    /// fetches from the source, stores the result with expiry `now + ttl` and
    /// returns it. A failed fetch leaves the stored snapshot untouched and the
    /// error is returned as-is, to this caller and to every caller that was
    /// already waiting on the refresh.
    pub async fn get_at(&self, now: DateTime<Utc>) -> Result<CachedProjects, FetchError> {
        if let Some(projects) = self.fresh_snapshot(now).await {
            return Ok(self.hit(projects));
        }

        let seen = self.refreshes.load(Ordering::Acquire);
        let mut last_error = self.refresh.lock().await;

        // A caller ahead of us in the gate may have refreshed already
        if let Some(projects) = self.fresh_snapshot(now).await {
            return Ok(self.hit(projects));
        }

        // ...or failed to, while we were queued
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(error) = last_error.as_ref() {
                tracing::debug!(%error, "sharing failed refresh with queued caller");
                return Err(error.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%now, "project cache miss, fetching from upstream");

        let outcome = self.source.fetch().await;
        *last_error = outcome.as_ref().err().cloned();
        self.refreshes.fetch_add(1, Ordering::Release);

        let records = match outcome {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(%error, "project cache refresh failed");
                return Err(error);
            }
        };

        let projects: Snapshot = records.into();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        *self.entry.write().await = Some(CacheEntry {
            projects: Arc::clone(&projects),
            expires_at,
        });

        tracing::info!(count = projects.len(), %expires_at, "project cache refreshed");

        Ok(CachedProjects {
            projects,
            status: CacheStatus::Miss,
        })
    }

    /// Lifecycle state as of `now`
    pub async fn state_at(&self, now: DateTime<Utc>) -> CacheState {
        match self.entry.read().await.as_ref() {
            None => CacheState::Empty,
            Some(entry) if entry.is_fresh(now) => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// Expiry of the stored snapshot, if any
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.entry.read().await.as_ref().map(|e| e.expires_at)
    }

    /// Hit and miss counts since creation
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn fresh_snapshot(&self, now: DateTime<Utc>) -> Option<Snapshot> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| Arc::clone(&entry.projects))
    }

    fn hit(&self, projects: Snapshot) -> CachedProjects {
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(count = projects.len(), "project cache hit");
        CachedProjects {
            projects,
            status: CacheStatus::Hit,
        }
    }
}
