// Loads zone file text into a Zone.

use crate::config::ZoneDefaults;
use crate::store::Store;
use crate::zone::normalize_domain;
use crate::zone::Upsert;
use crate::zones::Entry;
use crate::zones::File;
use crate::Address;
use crate::CanonicalName;
use crate::Error;
use crate::MailExchange;
use crate::NameServer;
use crate::Record;
use crate::Resource;
use crate::Result;
use crate::Service;
use crate::Text;
use crate::Zone;
use crate::SOA;
use log::{debug, info};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A parsed zone file, with every name absolute (without the trailing dot).
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneData {
    /// The origin the text was parsed against.
    pub origin: String,

    /// The first `$TTL`, if any.
    pub ttl: Option<Duration>,

    /// The owner and content of the single SOA record, if there was one.
    pub soa: Option<(String, SOA)>,

    /// Every other record, in file order.
    pub records: Vec<ParsedRecord>,
}

/// A resolved record, and whether its TTL was written on the record itself
/// rather than taken from `$TTL` or the previous record.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRecord {
    pub record: Record,
    pub explicit_ttl: bool,
}

/// Parses zone text against `origin` (with or without the trailing dot).
///
/// Fails with [`Error::Syntax`] if the text is not a valid zone file, or
/// holds more than one SOA record.
pub fn parse(text: &str, origin: &str) -> Result<ZoneData> {
    let origin = origin.strip_suffix('.').unwrap_or(origin).to_lowercase();

    let file = File::from_str(text)?;
    let ttl = file.default_ttl();
    let explicit: Vec<bool> = file
        .entries
        .iter()
        .filter_map(|entry| match entry {
            Entry::Record(record) => Some(record.ttl.is_some()),
            _ => None,
        })
        .collect();
    let file = File::new(Some(origin.clone()), file.entries);

    let mut soa = None;
    let mut records = Vec::new();

    // into_records yields exactly one record per Entry::Record, in order.
    for (record, explicit_ttl) in file.into_records()?.into_iter().zip(explicit) {
        match record.resource {
            Resource::SOA(s) => {
                if soa.is_some() {
                    return Err(Error::Syntax(format!(
                        "found a second SOA record at '{}', only one is allowed",
                        record.name
                    )));
                }
                soa = Some((record.name, s))
            }
            _ => records.push(ParsedRecord {
                record,
                explicit_ttl,
            }),
        }
    }

    Ok(ZoneData {
        origin,
        ttl,
        soa,
        records,
    })
}

/// Options for [`load_zone`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ImportOptions {
    /// The zone must already exist, and the text must have a SOA owned by it.
    pub strict_origin: bool,

    /// Merge into the existing records, instead of replacing them.
    pub partial: bool,
}

/// Records created and updated for one type.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Counts {
    pub created: usize,
    pub updated: usize,
}

impl Counts {
    fn add(&mut self, upsert: Upsert) {
        match upsert {
            Upsert::Created => self.created += 1,
            Upsert::Updated => self.updated += 1,
        }
    }
}

/// What an import changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub addresses: Counts,
    pub name_servers: Counts,
    pub mail_exchanges: Counts,
    pub canonical_names: Counts,
    pub texts: Counts,
    pub services: Counts,

    /// Records of a type the zone does not manage.
    pub ignored: usize,
}

impl ImportSummary {
    pub fn created(&self) -> usize {
        self.all().iter().map(|c| c.created).sum()
    }

    pub fn updated(&self) -> usize {
        self.all().iter().map(|c| c.updated).sum()
    }

    fn all(&self) -> [Counts; 6] {
        [
            self.addresses,
            self.name_servers,
            self.mail_exchanges,
            self.canonical_names,
            self.texts,
            self.services,
        ]
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} ignored",
            self.created(),
            self.updated(),
            self.ignored
        )
    }
}

/// The records of a [`ZoneData`], converted and checked, but not yet applied.
#[derive(Default)]
struct Pending {
    addresses: Vec<Address>,
    name_servers: Vec<NameServer>,
    mail_exchanges: Vec<MailExchange>,
    canonical_names: Vec<CanonicalName>,
    texts: Vec<Text>,
    services: Vec<Service>,
    ignored: usize,
}

impl Zone {
    /// Updates this zone from zone file text.
    ///
    /// SOA parameters and the serial are taken from the SOA, and the first
    /// `$TTL` becomes the zone's default TTL. Unless `partial`, every A, NS,
    /// MX, CNAME and TXT record is removed first. Records are then upserted
    /// by natural key. Nothing is modified if the text fails to parse.
    pub fn update_from_text(&mut self, text: &str, partial: bool) -> Result<ImportSummary> {
        let data = parse(text, &self.domain)?;
        self.update_from_data(data, partial)
    }

    /// As [`Zone::update_from_text`], for already parsed text.
    pub fn update_from_data(&mut self, data: ZoneData, partial: bool) -> Result<ImportSummary> {
        let ttl = data.ttl.unwrap_or(self.ttl);
        let pending = self.convert(&data.records, ttl)?;

        if let Some((_, soa)) = &data.soa {
            self.refresh = soa.refresh;
            self.retry = soa.retry;
            self.expire = soa.expire;
            self.minimum = soa.minimum;
            self.soa_email = self.relativize(&soa.rname);
            self.serial = soa.serial;
        }
        self.ttl = ttl;

        if !partial {
            self.addresses.clear();
            self.name_servers.clear();
            self.mail_exchanges.clear();
            self.canonical_names.clear();
            self.texts.clear();
        }

        let mut summary = ImportSummary {
            ignored: pending.ignored,
            ..Default::default()
        };

        // A, NS, MX, CNAME, TXT then SRV.
        for r in pending.addresses {
            summary.addresses.add(self.addresses.upsert(r));
        }
        for r in pending.name_servers {
            summary.name_servers.add(self.name_servers.upsert(r));
        }
        for r in pending.mail_exchanges {
            summary.mail_exchanges.add(self.mail_exchanges.upsert(r));
        }
        for r in pending.canonical_names {
            summary.canonical_names.add(self.canonical_names.upsert(r));
        }
        for r in pending.texts {
            summary.texts.add(self.texts.upsert(r));
        }
        for r in pending.services {
            summary.services.add(self.services.upsert(r));
        }

        info!("{}: imported {}", self.domain, summary);
        Ok(summary)
    }

    fn convert(&self, records: &[ParsedRecord], default_ttl: Duration) -> Result<Pending> {
        let mut pending = Pending::default();

        for ParsedRecord {
            record,
            explicit_ttl,
        } in records
        {
            let name = self.relativize(&record.name);

            // A TTL written on the record is kept, even if it matches the
            // default. An inherited one equal to the default stays inherited.
            let ttl = match record.ttl {
                ttl if !explicit_ttl && ttl == default_ttl => None,
                ttl => Some(ttl),
            };

            let result = match &record.resource {
                Resource::A(ip) => Address::new(&name, (*ip).into())
                    .map(|r| pending.addresses.push(r.with_ttl(ttl))),
                Resource::AAAA(ip) => Address::new(&name, (*ip).into())
                    .map(|r| pending.addresses.push(r.with_ttl(ttl))),
                Resource::NS(server) => NameServer::with_owner(&name, &self.relativize(server))
                    .map(|r| pending.name_servers.push(r.with_ttl(ttl))),
                Resource::MX(mx) => {
                    MailExchange::with_owner(&name, &self.relativize(&mx.exchange), mx.preference)
                        .map(|r| pending.mail_exchanges.push(r.with_ttl(ttl)))
                }
                Resource::CNAME(target) => CanonicalName::new(&name, &self.relativize(target))
                    .map(|r| pending.canonical_names.push(r.with_ttl(ttl))),
                Resource::TXT(txt) => Text::new(&name, &format!("\"{}\"", txt.joined()))
                    .map(|r| pending.texts.push(r.with_ttl(ttl))),
                Resource::SRV(srv) => Service::new(
                    &name,
                    srv.priority,
                    srv.weight,
                    srv.port,
                    &self.relativize(&srv.name),
                )
                .map(|r| pending.services.push(r.with_ttl(ttl))),
                Resource::PTR(_) | Resource::SOA(_) | Resource::Unknown(_) => {
                    debug!("{}: ignoring {:?}", self.domain, record);
                    pending.ignored += 1;
                    Ok(())
                }
            };

            if let Err(e) = result {
                return Err(Error::Syntax(format!("{}: {}", record.name, e)));
            }
        }

        Ok(pending)
    }
}

/// Loads zone text into the zone for `domain`, without saving it.
///
/// With `strict_origin` the zone must already be in `store`, and the text
/// must hold a SOA owned by `domain`, otherwise [`Error::NoOrigin`] is
/// returned. Without it, a new zone built from `defaults` is used when the
/// store has none, which is handy for previews.
pub fn load_zone<S: Store + ?Sized>(
    store: &S,
    defaults: &ZoneDefaults,
    domain: &str,
    text: &str,
    options: ImportOptions,
) -> Result<(Zone, ImportSummary)> {
    let domain = normalize_domain(domain)?;

    let mut zone = match store.get(&domain)? {
        Some(zone) => zone,
        None if options.strict_origin => {
            return Err(Error::NoOrigin(format!("zone '{}' does not exist", domain)))
        }
        None => Zone::new(&domain, defaults)?,
    };

    let data = parse(text, &domain)?;

    if options.strict_origin {
        match &data.soa {
            Some((owner, _)) if *owner == domain => (),
            Some((owner, _)) => {
                return Err(Error::NoOrigin(format!(
                    "SOA is owned by '{}', not '{}'",
                    owner, domain
                )))
            }
            None => return Err(Error::NoOrigin(format!("no SOA record for '{}'", domain))),
        }
    }

    let summary = zone.update_from_data(data, options.partial)?;
    Ok((zone, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Keyed;
    use pretty_assertions::assert_eq;

    const SCENARIO: &str = "$ORIGIN .\n$TTL 3600\nexample.com. IN SOA ns1.example.com. admin ( 2020010100 28800 7200 604800 600 )\n$ORIGIN example.com.\n@ 3600 IN NS ns1.example.com.\n@ 3600 IN NS ns2.example.com.\n@ 3600 IN A 10.0.0.1\n";

    fn zone() -> Zone {
        Zone::new("example.com", &ZoneDefaults::default()).unwrap()
    }

    #[test]
    fn test_parse() {
        let data = parse(SCENARIO, "example.com.").expect("failed to parse");

        assert_eq!(data.origin, "example.com");
        assert_eq!(data.ttl, Some(Duration::from_secs(3600)));
        assert_eq!(data.records.len(), 3);

        let (owner, soa) = data.soa.expect("missing SOA");
        assert_eq!(owner, "example.com");
        assert_eq!(soa.serial, 2020010100);
        assert_eq!(soa.rname, "admin");
    }

    #[test]
    fn test_parse_two_soa() {
        let text = "$TTL 60\n@ SOA ns1 admin 1 2 3 4 5\n@ SOA ns1 admin 2 2 3 4 5\n";
        match parse(text, "example.com") {
            Err(Error::Syntax(msg)) => assert!(msg.contains("second SOA"), "{}", msg),
            got => panic!("expected a syntax error, got {:?}", got),
        }
    }

    #[test]
    fn test_update_from_text() {
        let mut zone = zone();
        let summary = zone.update_from_text(SCENARIO, false).expect("failed to import");

        assert_eq!(zone.serial, 2020010100);
        assert_eq!(zone.expire, Duration::from_secs(604800));
        assert_eq!(zone.ttl, Duration::from_secs(3600));
        assert_eq!(zone.name_servers.len(), 2);
        assert_eq!(zone.addresses.len(), 1);
        assert_eq!(summary.created(), 3);
        assert_eq!(summary.updated(), 0);

        let ns: Vec<&str> = zone.name_servers.iter().map(|ns| ns.server.as_str()).collect();
        assert_eq!(ns, vec!["ns1", "ns2"]);

        // Written on the record, so kept even though it is the default.
        let ttls: Vec<Option<Duration>> = zone.addresses.iter().map(|a| a.ttl).collect();
        assert_eq!(ttls, vec![Some(Duration::from_secs(3600))]);
    }

    #[test]
    fn test_update_ttls() {
        let text = "$ORIGIN example.com.\n$TTL 300\n\
            a1 A 192.0.2.1\n\
            a2 300 A 192.0.2.2\n\
            a3 60 A 192.0.2.3\n\
            a4 A 192.0.2.4\n";

        let mut zone = zone();
        zone.update_from_text(text, false).expect("failed to import");

        let got: Vec<(&str, Option<u64>)> = zone
            .addresses
            .iter()
            .map(|a| (a.name.as_str(), a.ttl.map(|ttl| ttl.as_secs())))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a1", None),      // $TTL
                ("a2", Some(300)), // Explicit, equal to $TTL
                ("a3", Some(60)),
                ("a4", None), // $TTL wins over the previous record
            ]
        );
    }

    #[test]
    fn test_update_from_text_names() {
        let text = "$ORIGIN example.com.\n$TTL 300\n\
            WWW 60 A 192.0.2.1\n\
            www.example.com. AAAA 2001:db8::1\n\
            @ MX 10 Mail.Example.com.\n\
            @ MX 20 mx.other.org.\n\
            docs CNAME ghs.googlehosted.com.\n\
            @ TXT \"v=spf1 \" \"-all\"\n\
            _sip._tls SRV 100 1 443 sipdir.online.lync.com.\n\
            4 PTR host\n\
            @ CAA 0 issue \"ca.example\"\n";

        let mut zone = zone();
        let summary = zone.update_from_text(text, false).expect("failed to import");

        assert_eq!(zone.ttl, Duration::from_secs(300));
        assert_eq!(summary.ignored, 2);

        let a: Vec<(String, Option<Duration>)> = zone
            .addresses
            .iter()
            .map(|a| (a.name.clone(), a.ttl))
            .collect();
        assert_eq!(
            a,
            vec![
                ("www".to_string(), Some(Duration::from_secs(60))),
                ("www".to_string(), None),
            ]
        );

        let mx: Vec<(u16, &str)> = zone
            .mail_exchanges
            .sorted()
            .iter()
            .map(|mx| (mx.priority, mx.exchange.as_str()))
            .collect();
        assert_eq!(mx, vec![(10, "mail"), (20, "mx.other.org.")]);

        let cname = zone.canonical_names.get(&"docs".to_string()).expect("missing CNAME");
        assert_eq!(cname.target, "ghs.googlehosted.com.");

        let txt = zone.texts.iter().next().expect("missing TXT");
        assert_eq!(txt.key(), ("@".to_string(), "\"v=spf1 -all\"".to_string()));

        let srv = zone.services.iter().next().expect("missing SRV");
        assert_eq!(srv.name, "_sip._tls");
        assert_eq!(srv.port, 443);
    }

    #[test]
    fn test_update_partial() {
        let mut zone = zone();
        zone.update_from_text(SCENARIO, false).unwrap();

        let extra = "$ORIGIN example.com.\n$TTL 3600\nwww A 10.0.0.2\n@ 60 A 10.0.0.1\n";

        // Merge keeps the name servers, and updates the apex A in place.
        let mut merged = zone.clone();
        let summary = merged.update_from_text(extra, true).unwrap();
        assert_eq!(merged.name_servers.len(), 2);
        assert_eq!(merged.addresses.len(), 2);
        assert_eq!(summary.addresses, Counts { created: 1, updated: 1 });
        assert_eq!(merged.serial, 2020010100); // No SOA, so untouched

        // A full import replaces them.
        let mut replaced = zone.clone();
        replaced.update_from_text(extra, false).unwrap();
        assert_eq!(replaced.name_servers.len(), 0);
        assert_eq!(replaced.addresses.len(), 2);
    }

    #[test]
    fn test_update_from_text_errors() {
        let tests = vec![
            "$ORIGIN example.com.\n@ A 10.0.0.1\n",                 // No TTL
            "$TTL 60\n@ A 10.0.0.1\n@ A 10.0.0.256\n",              // Bad address
            "$TTL 60\n@ SRV 1 1 0 sip\n",                           // Bad port
            "$TTL 60\nnot_a_service SRV 1 1 5060 sip\n",            // Bad service name
            "$TTL 60\n@ TXT \"has a \\\" quote\"\n",                // Too many quotes
        ];

        for text in tests {
            let mut zone = zone();
            let before = zone.clone();
            match zone.update_from_text(text, false) {
                Err(Error::Syntax(_)) => (),
                got => panic!("'{}' should be a syntax error, got {:?}", text, got),
            }
            assert_eq!(zone, before, "'{}' modified the zone", text);
        }
    }
}
