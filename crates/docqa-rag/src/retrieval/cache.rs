//! Process-wide store of document indexes
//!
//! Indexes are keyed by document identifier exactly as supplied. An index is built at
//! most once per identifier: a caller that misses registers an in-flight build before
//! any backend call, and concurrent callers for the same identifier wait on it and
//! receive its outcome, success or failure. Nothing is cached for a failed build and
//! the marker is cleared, so the next request starts a fresh embedding pass. If the
//! building caller is dropped mid-build, one of its waiters takes over.

use async_trait::async_trait;
use futures::future::BoxFuture;
use mini_moka::sync::{Cache, ConcurrentCacheExt};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::CacheConfig;
use crate::error::{Error, Result};

use super::index::DocumentIndex;

/// Deferred index build. Futures are lazy, so nothing runs unless the store polls it.
pub type IndexBuild<'a> = BoxFuture<'a, Result<DocumentIndex>>;

/// Store interface the pipeline is written against
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Return the cached index for `id`, or run `build` (at most once across
    /// concurrent callers) and cache its result
    async fn get_or_build(&self, id: &str, build: IndexBuild<'_>) -> Result<Arc<DocumentIndex>>;

    /// Cached index, if present and not expired
    fn get(&self, id: &str) -> Option<Arc<DocumentIndex>>;

    /// Whether a usable index is cached for `id`
    fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Whether a build for `id` is currently running
    fn is_building(&self, id: &str) -> bool;

    /// Drop the index for `id`; a build already in flight will not be installed.
    /// Returns true if a cached index was removed.
    fn invalidate(&self, id: &str) -> bool;

    /// Number of cached indexes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;
}

/// Cache counters
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub builds: u64,
}

/// Outcome of one build, shared with every caller waiting on it
type Outcome = Result<Arc<DocumentIndex>>;

struct InFlight {
    /// Distinguishes this build from a later one for the same key
    flight_id: u64,
    /// Key generation when the build was registered
    generation: u64,
    outcome: watch::Receiver<Option<Outcome>>,
}

#[derive(Default)]
struct FlightTable {
    in_flight: HashMap<String, InFlight>,
    generations: HashMap<String, u64>,
    next_flight_id: u64,
}

impl FlightTable {
    fn generation(&self, id: &str) -> u64 {
        self.generations.get(id).copied().unwrap_or(0)
    }

    fn remove_if_current(&mut self, id: &str, flight_id: u64) {
        if self
            .in_flight
            .get(id)
            .is_some_and(|flight| flight.flight_id == flight_id)
        {
            self.in_flight.remove(id);
        }
    }
}

enum Role {
    /// Index was installed while we were deciding
    Ready(Arc<DocumentIndex>),
    /// Another caller is building; wait for its outcome
    Wait(watch::Receiver<Option<Outcome>>),
    /// This caller builds
    Build(Ticket),
}

/// The building caller's claim on a key
struct Ticket {
    flight_id: u64,
    generation: u64,
    sender: watch::Sender<Option<Outcome>>,
}

/// Clears the marker if the building caller is dropped before publishing
struct FlightGuard<'a> {
    cache: &'a IndexCache,
    id: &'a str,
    flight_id: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.cache
            .flights
            .lock()
            .remove_if_current(self.id, self.flight_id);
    }
}

/// In-memory [`IndexStore`] with size-bounded eviction and optional TTL
pub struct IndexCache {
    entries: Cache<String, Arc<DocumentIndex>>,
    /// In-flight builds and per-key generations share one lock so invalidation,
    /// registration and installation cannot interleave
    flights: Mutex<FlightTable>,
    hits: AtomicU64,
    builds: AtomicU64,
}

impl IndexCache {
    /// Create an unbounded cache with no expiry
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_limits(config.max_entries, config.ttl_secs.map(Duration::from_secs))
    }

    pub fn with_limits(max_entries: Option<usize>, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::<String, Arc<DocumentIndex>>::builder();
        if let Some(max) = max_entries {
            builder = builder.max_capacity(max.max(1) as u64);
        }
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
            flights: Mutex::new(FlightTable::default()),
            hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    /// Join the build in flight for `id`, or register this caller as its builder
    fn join_or_register(&self, id: &str) -> Role {
        let mut flights = self.flights.lock();

        // Installation happens under this lock, so a finished build is visible here
        if let Some(index) = self.entries.get(&id.to_string()) {
            return Role::Ready(index);
        }
        if let Some(flight) = flights.in_flight.get(id) {
            return Role::Wait(flight.outcome.clone());
        }

        let (sender, outcome) = watch::channel(None);
        let ticket = Ticket {
            flight_id: flights.next_flight_id,
            generation: flights.generation(id),
            sender,
        };
        flights.next_flight_id += 1;
        flights.in_flight.insert(
            id.to_string(),
            InFlight {
                flight_id: ticket.flight_id,
                generation: ticket.generation,
                outcome,
            },
        );
        Role::Build(ticket)
    }

    /// Install a successful build unless the key was invalidated after it started,
    /// clear the marker, and hand the outcome to waiters
    fn finish(&self, id: &str, ticket: Ticket, outcome: Outcome) -> Outcome {
        {
            let mut flights = self.flights.lock();
            if let Ok(index) = &outcome {
                if flights.generation(id) == ticket.generation {
                    self.entries.insert(id.to_string(), Arc::clone(index));
                } else {
                    tracing::info!("Index for {} was invalidated during build; not caching", id);
                }
            }
            flights.remove_if_current(id, ticket.flight_id);
        }

        ticket.sender.send_replace(Some(outcome.clone()));
        outcome
    }

    async fn build_as_owner(&self, id: &str, ticket: Ticket, build: IndexBuild<'_>) -> Outcome {
        let _guard = FlightGuard {
            cache: self,
            id,
            flight_id: ticket.flight_id,
        };

        self.builds.fetch_add(1, Ordering::Relaxed);
        let outcome = build.await.map(Arc::new);
        if let Err(e) = &outcome {
            tracing::warn!("Index build for {} failed: {}", id, e);
        }
        self.finish(id, ticket, outcome)
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for IndexCache {
    async fn get_or_build(&self, id: &str, build: IndexBuild<'_>) -> Result<Arc<DocumentIndex>> {
        let mut build = Some(build);

        loop {
            if let Some(index) = self.get(id) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Using cached vectors for {}", id);
                return Ok(index);
            }

            match self.join_or_register(id) {
                Role::Ready(index) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(index);
                }
                Role::Wait(mut outcome) => {
                    tracing::debug!("Waiting for in-flight build of {}", id);
                    let shared = outcome
                        .wait_for(Option::is_some)
                        .await
                        .map(|outcome| Option::clone(&outcome));
                    match shared {
                        Ok(Some(outcome)) => return outcome,
                        // Builder was dropped without finishing; try again
                        _ => continue,
                    }
                }
                Role::Build(ticket) => {
                    let Some(build) = build.take() else {
                        return Err(Error::internal(format!("Index build for {} already consumed", id)));
                    };
                    return self.build_as_owner(id, ticket, build).await;
                }
            }
        }
    }

    fn get(&self, id: &str) -> Option<Arc<DocumentIndex>> {
        self.entries.get(&id.to_string())
    }

    fn is_building(&self, id: &str) -> bool {
        self.flights.lock().in_flight.contains_key(id)
    }

    fn invalidate(&self, id: &str) -> bool {
        let key = id.to_string();
        let mut flights = self.flights.lock();
        *flights.generations.entry(key.clone()).or_insert(0) += 1;
        flights.in_flight.remove(id);

        let removed = self.entries.get(&key).is_some();
        self.entries.invalidate(&key);
        drop(flights);

        if removed {
            tracing::info!("Invalidated cached index for {}", id);
        }
        removed
    }

    fn len(&self) -> usize {
        // Apply pending evictions so the count is accurate
        self.entries.sync();
        self.entries.entry_count() as usize
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            in_flight: self.flights.lock().in_flight.len(),
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }
}
