//! Cached validation verdicts, keyed by zone and check.

use crate::validation::Verdict;
use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use strum_macros::Display;

/// The kind of check a cached verdict belongs to.
#[derive(Copy, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum Check {
    Validation,
    Delegation,
}

/// Stores verdicts until the zone is invalidated.
///
/// Each zone has a generation, bumped on every invalidation. A caller takes
/// the generation with [`ValidationCache::begin`] before computing a verdict,
/// and [`ValidationCache::set`] drops the verdict if the zone was invalidated
/// in the meantime.
///
/// Verdicts are also tagged with the serial of the zone they were computed
/// from, and [`ValidationCache::get`] only returns one for the same serial.
/// A verdict for a copy read before a save can then never answer for the
/// saved zone, even if it was stored after the invalidation.
pub trait ValidationCache {
    fn begin(&self, domain: &str) -> u64;

    fn get(&self, domain: &str, check: Check, serial: u32) -> Option<Verdict>;

    /// Returns false if the verdict was stale, and so not stored.
    fn set(
        &self,
        domain: &str,
        check: Check,
        generation: u64,
        serial: u32,
        verdict: Verdict,
    ) -> bool;

    /// Forgets every verdict for the zone.
    fn invalidate(&self, domain: &str);
}

#[derive(Debug, Default)]
struct ZoneEntry {
    generation: u64,
    verdicts: HashMap<Check, (u32, Verdict)>,
}

/// A process local [`ValidationCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    zones: Mutex<HashMap<String, ZoneEntry>>,
}

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ZoneEntry>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        match self.zones.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ValidationCache for MemoryCache {
    fn begin(&self, domain: &str) -> u64 {
        self.lock()
            .get(domain)
            .map(|entry| entry.generation)
            .unwrap_or_default()
    }

    fn get(&self, domain: &str, check: Check, serial: u32) -> Option<Verdict> {
        let zones = self.lock();
        let (cached, verdict) = zones.get(domain)?.verdicts.get(&check)?;

        if *cached != serial {
            debug!(
                "{}: ignoring {} verdict for serial {} (want {})",
                domain, check, cached, serial
            );
            return None;
        }
        Some(verdict.clone())
    }

    fn set(
        &self,
        domain: &str,
        check: Check,
        generation: u64,
        serial: u32,
        verdict: Verdict,
    ) -> bool {
        let mut zones = self.lock();
        let entry = zones.entry(domain.to_string()).or_default();

        if entry.generation != generation {
            debug!(
                "{}: dropping stale {} verdict (generation {} != {})",
                domain, check, generation, entry.generation
            );
            return false;
        }

        entry.verdicts.insert(check, (serial, verdict));
        true
    }

    fn invalidate(&self, domain: &str) {
        let mut zones = self.lock();
        let entry = zones.entry(domain.to_string()).or_default();

        entry.generation += 1;
        entry.verdicts.clear();

        debug!("{}: cache invalidated", domain);
    }
}
