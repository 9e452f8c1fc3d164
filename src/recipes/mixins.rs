// Capability mixins, each owning one record type of a zone.
//
// NS and MX are exclusive: every existing record of the type is removed
// before the rows are inserted. The rest merge into what is already there.

use crate::zone::Keyed;
use crate::zone::ZoneRecord;
use crate::CanonicalName;
use crate::MailExchange;
use crate::NameServer;
use crate::Result;
use crate::Service;
use crate::Text;
use crate::Zone;
use log::debug;

/// Replaces every NS record with `rows`.
pub fn apply_name_servers(zone: &mut Zone, rows: &[NameServer]) -> Result<()> {
    zone.name_servers.clear();
    for row in rows {
        zone.name_servers.insert(row.clone())?;
    }
    Ok(())
}

/// Replaces every MX record with `rows`.
pub fn apply_mail_exchange(zone: &mut Zone, rows: &[MailExchange]) -> Result<()> {
    zone.mail_exchanges.clear();
    for row in rows {
        zone.mail_exchanges.insert(row.clone())?;
    }
    Ok(())
}

pub fn apply_canonical_names(zone: &mut Zone, rows: &[CanonicalName]) -> Result<()> {
    for row in rows {
        zone.canonical_names.upsert(row.clone());
    }
    Ok(())
}

/// Upserts `rows`. A SPF row first removes any other SPF record at the same
/// owner, as there must only be one.
pub fn apply_text(zone: &mut Zone, rows: &[Text]) -> Result<()> {
    for row in rows {
        let mut row = row.clone();
        row.canonicalize(&zone.domain);

        if row.is_spf() {
            let key = row.key();
            zone.texts.retain(|t| {
                let stale = t.is_spf() && t.name == row.name && t.key() != key;
                if stale {
                    debug!("removing old SPF record {:?}", t);
                }
                !stale
            });
        }
        zone.texts.upsert(row);
    }
    Ok(())
}

pub fn apply_services(zone: &mut Zone, rows: &[Service]) -> Result<()> {
    for row in rows {
        zone.services.upsert(row.clone());
    }
    Ok(())
}

/// A data table for each mixin. An exclusive type left as None is not
/// touched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preset {
    pub name_servers: Option<Vec<NameServer>>,
    pub mail_exchanges: Option<Vec<MailExchange>>,
    pub canonical_names: Vec<CanonicalName>,
    pub texts: Vec<Text>,
    pub services: Vec<Service>,
}

impl Preset {
    /// Applies NS, MX, CNAME, TXT then SRV, stopping at the first error.
    pub fn apply(&self, zone: &mut Zone) -> Result<()> {
        if let Some(rows) = &self.name_servers {
            apply_name_servers(zone, rows)?;
        }
        if let Some(rows) = &self.mail_exchanges {
            apply_mail_exchange(zone, rows)?;
        }
        apply_canonical_names(zone, &self.canonical_names)?;
        apply_text(zone, &self.texts)?;
        apply_services(zone, &self.services)?;
        Ok(())
    }
}
