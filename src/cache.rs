//! Two-level coordinator: the user-facing `Cache` handle.
//!
//! Sequences reads, writes, conditional writes, deletes, and promotions
//! across L1 and L2, and fuses per-tier statistics into one snapshot.

use crate::error::{CacheError, CacheResult};
use crate::l1::{L1Backend, L1Stats};
use crate::l2::{L2Backend, L2Stats};
use crate::serializer::{Serializer, SerializerExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-tier removal counts returned by [`Cache::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearReport {
    pub l1: usize,
    pub l2: usize,
}

/// Fused statistics snapshot. Every field is an owned copy; nothing here
/// borrows from the live `Cache`.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub l1: Option<L1Stats>,
    pub l2: Option<L2Stats>,
}

pub struct Cache {
    l1: Option<L1Backend>,
    l2: Option<L2Backend>,
    serializer: Arc<dyn Serializer>,
    l1_default_ttl: Option<Duration>,
    closed: AtomicBool,
}

impl Cache {
    pub(crate) fn new(
        l1: Option<L1Backend>,
        l2: Option<L2Backend>,
        serializer: Arc<dyn Serializer>,
        l1_default_ttl: Option<Duration>,
    ) -> Self {
        Self {
            l1,
            l2,
            serializer,
            l1_default_ttl,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Configuration(
                "cache handle has been closed".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    /// Reads through L1, falling back to L2 and promoting on an L2 hit.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        self.ensure_open()?;
        if let Some(l1) = &self.l1 {
            if let Some(bytes) = l1.get(key) {
                let value: T = self.serializer.deserialize(&bytes)?;
                return Ok(Some(value));
            }
        }
        let Some(l2) = &self.l2 else {
            return Ok(None);
        };
        match l2.get(key) {
            Ok(Some(bytes)) => {
                let value: T = self.serializer.deserialize(&bytes)?;
                if let Some(l1) = &self.l1 {
                    // Best-effort promotion; failures are impossible for
                    // the in-process L1 map but would be ignored anyway.
                    l1.set(key, bytes, self.l1_default_ttl);
                }
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_connection() => {
                tracing::debug!(%key, error = %e, "l2 get absorbed, reporting miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes both tiers; the L2 write is best-effort when L1 is enabled.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.ensure_open()?;
        let bytes = self.serializer.serialize(value)?;
        let l1_ttl = ttl.or(self.l1_default_ttl);

        if let Some(l1) = &self.l1 {
            l1.set(key, bytes.clone(), l1_ttl);
        }

        if let Some(l2) = &self.l2 {
            match l2.set(key, bytes, ttl) {
                Ok(()) => Ok(()),
                Err(e) if self.l1.is_none() => Err(e),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "l2 set absorbed, l1 already has the value");
                    Ok(())
                }
            }
        } else {
            Ok(())
        }
    }

    /// Conditional write with L2-first semantics.
    pub fn set_if_not_exist<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        self.ensure_open()?;
        let bytes = self.serializer.serialize(value)?;
        let l1_ttl = ttl.or(self.l1_default_ttl);

        match (&self.l1, &self.l2) {
            (l1, Some(l2)) => match l2.set_if_not_exist(key, bytes.clone(), ttl) {
                Ok(true) => {
                    if let Some(l1) = l1 {
                        l1.set(key, bytes, l1_ttl);
                    }
                    Ok(true)
                }
                Ok(false) => Ok(false),
                Err(e) if e.is_connection() => {
                    tracing::warn!(%key, error = %e, "l2 set_if_not_exist unreachable, falling back to l1");
                    match l1 {
                        Some(l1) => Ok(l1.set_if_not_exist(key, bytes, l1_ttl)),
                        None => Err(e),
                    }
                }
                Err(e) => Err(e),
            },
            (Some(l1), None) => Ok(l1.set_if_not_exist(key, bytes, l1_ttl)),
            (None, None) => Err(CacheError::Configuration(
                "no tier enabled for set_if_not_exist".to_string(),
            )),
        }
    }

    /// Removes from L1 first, then L2; both are best-effort.
    pub fn delete(&self, key: &str) -> CacheResult<()> {
        self.ensure_open()?;
        if let Some(l1) = &self.l1 {
            l1.delete(key);
        }
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.delete(key) {
                tracing::debug!(%key, error = %e, "l2 delete absorbed");
            }
        }
        Ok(())
    }

    /// Clears both tiers within the configured key prefix.
    pub fn clear(&self) -> CacheResult<ClearReport> {
        self.ensure_open()?;
        let l1 = self.l1.as_ref().map_or(0, |l1| l1.clear());
        let l2 = match &self.l2 {
            Some(l2) => match l2.clear() {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "l2 clear absorbed");
                    0
                }
            },
            None => 0,
        };
        Ok(ClearReport { l1, l2 })
    }

    /// Checks L1 first, then L2 through the breaker. Does not promote.
    pub fn exists(&self, key: &str) -> CacheResult<bool> {
        self.ensure_open()?;
        if let Some(l1) = &self.l1 {
            if l1.exists(key) {
                return Ok(true);
            }
        }
        match &self.l2 {
            Some(l2) => match l2.exists(key) {
                Ok(present) => Ok(present),
                Err(e) => {
                    tracing::debug!(%key, error = %e, "l2 exists absorbed");
                    Ok(false)
                }
            },
            None => Ok(false),
        }
    }

    /// Minimum remaining TTL across whichever tiers hold `key`.
    pub fn get_ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        self.ensure_open()?;
        let mut present_anywhere = false;
        let mut finite_candidates = Vec::new();

        if let Some(l1) = &self.l1 {
            if l1.exists(key) {
                present_anywhere = true;
                if let Some(ttl) = l1.get_ttl(key) {
                    finite_candidates.push(ttl);
                }
            }
        }
        if let Some(l2) = &self.l2 {
            match l2.exists(key) {
                Ok(true) => {
                    present_anywhere = true;
                    if let Ok(Some(ttl)) = l2.get_ttl(key) {
                        finite_candidates.push(ttl);
                    }
                }
                Ok(false) => {}
                Err(e) => tracing::debug!(%key, error = %e, "l2 get_ttl absorbed"),
            }
        }

        if !present_anywhere {
            return Ok(None);
        }
        Ok(finite_candidates.into_iter().min())
    }

    /// Union of L1 and (prefix-stripped) L2 keys.
    pub fn list_keys(&self, prefix: Option<&str>) -> CacheResult<Vec<String>> {
        self.ensure_open()?;
        let mut keys: HashSet<String> = HashSet::new();
        if let Some(l1) = &self.l1 {
            keys.extend(l1.list_keys(prefix));
        }
        if let Some(l2) = &self.l2 {
            match l2.list_keys() {
                Ok(l2_keys) => keys.extend(
                    l2_keys
                        .into_iter()
                        .filter(|k| prefix.is_none_or(|p| k.starts_with(p))),
                ),
                Err(e) => tracing::debug!(error = %e, "l2 list_keys absorbed"),
            }
        }
        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        Ok(keys)
    }

    /// Fused per-tier statistics snapshot.
    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            l1: self.l1.as_ref().map(L1Backend::get_stats),
            l2: self.l2.as_ref().map(L2Backend::get_stats),
        }
    }

    /// Disposes the handle. Idempotent; subsequent calls to any other
    /// method return `CacheError::Configuration`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
