//! L1 backend: a bounded, in-process key/value map with per-entry TTL
//! and a choice of eviction policy.
//!
//! Hand-rolled rather than built on a general-purpose cache crate: exact
//! eviction at capacity is required here (after `N+M` inserts the map holds
//! precisely `N` entries), a guarantee approximate/eventually-consistent
//! caches (the kind commonly reached for in this ecosystem) do not provide.
//! Capacity is enforced synchronously, inline with `set`, under a single
//! exclusive lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Which entry to evict when a `set` would exceed `maxsize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Evict by nearest TTL deadline first, then by insertion order for
    /// entries with no deadline.
    Ttl,
    /// Evict by least-recently-accessed; TTL still expires entries lazily.
    Lru,
}

struct Entry {
    value: Vec<u8>,
    deadline: Option<Instant>,
    seq: u64,
    last_access: u64,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

struct State {
    map: HashMap<String, Entry>,
    next_seq: u64,
}

/// Read-only snapshot of L1 counters, safe to hand to callers.
#[derive(Debug, Clone, Copy)]
pub struct L1Stats {
    pub enabled: bool,
    pub size: usize,
    pub maxsize: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

pub struct L1Backend {
    state: Mutex<State>,
    maxsize: usize,
    policy: EvictionPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl L1Backend {
    pub fn new(maxsize: usize, policy: EvictionPolicy) -> Self {
        Self {
            state: Mutex::new(State {
                map: HashMap::new(),
                next_seq: 0,
            }),
            maxsize: maxsize.max(1),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let seq = state.next_seq;
        if let Some(entry) = state.map.get_mut(key) {
            if entry.is_expired(now) {
                state.map.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            entry.last_access = seq;
            state.next_seq += 1;
            let value = entry.value.clone();
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(value)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.purge_expired_locked(&mut state, now);
        let seq = state.next_seq;
        state.next_seq += 1;
        let deadline = ttl.map(|d| now + d);
        if !state.map.contains_key(key) && state.map.len() >= self.maxsize {
            self.evict_one_locked(&mut state);
        }
        state.map.insert(
            key.to_string(),
            Entry {
                value,
                deadline,
                seq,
                last_access: seq,
            },
        );
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    /// No-op when the key is already present (expired entries count as
    /// absent, consistent with `get`'s lazy-expiry behavior).
    pub fn set_if_not_exist(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.purge_expired_locked(&mut state, now);
        if state.map.contains_key(key) {
            return false;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        let deadline = ttl.map(|d| now + d);
        if state.map.len() >= self.maxsize {
            self.evict_one_locked(&mut state);
        }
        state.map.insert(
            key.to_string(),
            Entry {
                value,
                deadline,
                seq,
                last_access: seq,
            },
        );
        self.sets.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn delete(&self, key: &str) -> bool {
        self.state.lock().map.remove(key).is_some()
    }

    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.map.len();
        state.map.clear();
        count
    }

    pub fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();
        match state.map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                state.map.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn get_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();
        match state.map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                state.map.remove(key);
                None
            }
            Some(entry) => entry.deadline.map(|d| d.saturating_duration_since(now)),
            None => None,
        }
    }

    pub fn list_keys(&self, prefix: Option<&str>) -> Vec<String> {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.purge_expired_locked(&mut state, now);
        state
            .map
            .keys()
            .filter(|k| prefix.is_none_or(|p| k.starts_with(p)))
            .cloned()
            .collect()
    }

    pub fn get_size(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.purge_expired_locked(&mut state, now);
        state.map.len()
    }

    pub fn get_stats(&self) -> L1Stats {
        L1Stats {
            enabled: true,
            size: self.get_size(),
            maxsize: self.maxsize,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }

    fn purge_expired_locked(&self, state: &mut State, now: Instant) {
        state.map.retain(|_, entry| !entry.is_expired(now));
    }

    /// Evicts exactly one entry according to `self.policy`. Called only
    /// while `state.map.len() >= self.maxsize`, i.e. immediately before an
    /// insert that would otherwise exceed capacity.
    fn evict_one_locked(&self, state: &mut State) {
        let victim = match self.policy {
            EvictionPolicy::Ttl => state
                .map
                .iter()
                .min_by_key(|(_, e)| (e.deadline.is_none(), e.deadline, e.seq))
                .map(|(k, _)| k.clone()),
            EvictionPolicy::Lru => state
                .map
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone()),
        };
        if let Some(key) = victim {
            state.map.remove(&key);
        }
    }
}
