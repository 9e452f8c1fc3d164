//! Zone storage, and the save/delete lifecycle.

use crate::cache::MemoryCache;
use crate::cache::ValidationCache;
use crate::zone::next_serial;
use crate::zone::normalize_domain;
use crate::Error;
use crate::Result;
use crate::Zone;
use chrono::Local;
use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

/// Where zones live between operations.
///
/// Saving assigns the next serial and forgets any cached verdicts for the
/// zone. Deleting a zone also deletes every record it owns.
pub trait Store {
    fn get(&self, domain: &str) -> Result<Option<Zone>>;

    /// Saves the zone, updating `zone.serial` to the value written.
    fn save(&self, zone: &mut Zone) -> Result<()>;

    /// Returns false if there was no such zone.
    fn delete(&self, domain: &str) -> Result<bool>;

    /// Every stored domain, sorted.
    fn domains(&self) -> Result<Vec<String>>;

    /// Forgets the zone's cached verdicts, without saving it.
    fn invalidate(&self, domain: &str);
}

/// A [`Store`] kept in memory.
pub struct MemoryStore<C = MemoryCache> {
    zones: Mutex<BTreeMap<String, Zone>>,
    cache: Arc<C>,
}

impl<C: ValidationCache> MemoryStore<C> {
    pub fn new(cache: Arc<C>) -> MemoryStore<C> {
        MemoryStore {
            zones: Mutex::new(BTreeMap::new()),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Zone>>> {
        self.zones
            .lock()
            .map_err(|_| Error::Io(io::Error::new(io::ErrorKind::Other, "zone store lock poisoned")))
    }

    /// As [`Store::save`], as if today was `today`.
    pub fn save_on(&self, zone: &mut Zone, today: NaiveDate) -> Result<()> {
        let mut zones = self.lock()?;

        // The serial is computed while holding the lock, so two saves of the
        // same zone can't both pick the same value.
        let stored = zones.get(&zone.domain).map(|z| z.serial).unwrap_or_default();
        zone.serial = next_serial(stored.max(zone.serial), today);

        zones.insert(zone.domain.clone(), zone.clone());
        drop(zones);

        self.cache.invalidate(&zone.domain);
        info!("{}: saved with serial {}", zone.domain, zone.serial);

        Ok(())
    }
}

impl<C: ValidationCache> Store for MemoryStore<C> {
    fn get(&self, domain: &str) -> Result<Option<Zone>> {
        let domain = normalize_domain(domain)?;
        Ok(self.lock()?.get(&domain).cloned())
    }

    fn save(&self, zone: &mut Zone) -> Result<()> {
        self.save_on(zone, Local::now().date_naive())
    }

    fn delete(&self, domain: &str) -> Result<bool> {
        let domain = normalize_domain(domain)?;
        let deleted = self.lock()?.remove(&domain);

        self.cache.invalidate(&domain);

        match deleted {
            Some(zone) => {
                info!(
                    "{}: deleted, with {} records",
                    domain,
                    zone.record_count()
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn domains(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn invalidate(&self, domain: &str) {
        self.cache.invalidate(domain)
    }
}
