//! The Zone aggregate and the records it owns.
//!
//! Each record type keeps its owner `name` relative to the zone (or absolute
//! when it ends with a dot, "@" for the apex), and an optional TTL which, when
//! absent, inherits the zone's default.
use crate::config::ZoneDefaults;
use crate::field_error;
use crate::fields::*;
use crate::Error;
use crate::Result;
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::net::IpAddr;
use std::time::Duration;

/// A record with a natural key, unique within its zone.
pub trait Keyed {
    type Key: PartialEq + Debug;

    fn key(&self) -> Self::Key;

    /// Copies the mutable (non key) fields from `other`.
    fn update_from(&mut self, other: Self);

    /// The declared ordering used when rendering.
    fn order(&self, other: &Self) -> Ordering;
}

/// Fields common to every record owned by a [`Zone`].
pub trait ZoneRecord {
    fn name(&self) -> &str;
    fn ttl(&self) -> Option<Duration>;
    fn set_ttl(&mut self, ttl: Option<Duration>);

    /// Makes absolute names inside `origin` relative to it.
    fn canonicalize(&mut self, origin: &str);

    fn fully_qualified_name(&self, zone: &Zone) -> String {
        zone.fqdn(self.name())
    }
}

/// The outcome of a [`RecordSet::upsert`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Upsert {
    Created,
    Updated,
}

/// The records of one type, unique by natural key, kept in insertion order.
///
/// Records are canonicalized against the zone's origin as they are added, so
/// "www.example.com." and "www" share a key.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSet<R> {
    origin: String,
    records: Vec<R>,
}

impl<R: Keyed + ZoneRecord + Debug> RecordSet<R> {
    /// An empty set for the zone `origin` (lower case, without the dot).
    pub fn new(origin: &str) -> Self {
        RecordSet {
            origin: origin.to_string(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    /// Mutable access to every record, for bulk updates.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, R> {
        self.records.iter_mut()
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.records.iter().find(|r| &r.key() == key)
    }

    fn position(&self, key: &R::Key) -> Option<usize> {
        self.records.iter().position(|r| &r.key() == key)
    }

    /// Adds a new record, failing if one with the same key already exists.
    pub fn insert(&mut self, mut record: R) -> Result<&mut R> {
        record.canonicalize(&self.origin);
        let key = record.key();
        if self.position(&key).is_some() {
            return Err(Error::Conflict(format!("{:?} already exists", key)));
        }

        let i = self.records.len();
        self.records.push(record);
        Ok(&mut self.records[i])
    }

    /// Updates the record with the same key in place, else adds it.
    pub fn upsert(&mut self, mut record: R) -> Upsert {
        record.canonicalize(&self.origin);
        match self.position(&record.key()) {
            Some(i) => {
                debug!("updating {:?}", record);
                self.records[i].update_from(record);
                Upsert::Updated
            }
            None => {
                debug!("creating {:?}", record);
                self.records.push(record);
                Upsert::Created
            }
        }
    }

    /// Returns the record with the same key as `record`, adding `record`
    /// only if there was none.
    pub fn get_or_create(&mut self, mut record: R) -> &mut R {
        record.canonicalize(&self.origin);
        let i = match self.position(&record.key()) {
            Some(i) => i,
            None => {
                self.records.push(record);
                self.records.len() - 1
            }
        };
        &mut self.records[i]
    }

    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        self.position(key).map(|i| self.records.remove(i))
    }

    pub fn retain<F: FnMut(&R) -> bool>(&mut self, f: F) {
        self.records.retain(f)
    }

    pub fn clear(&mut self) {
        self.records.clear()
    }

    /// The records in their declared ordering.
    pub fn sorted(&self) -> Vec<&R> {
        let mut sorted: Vec<&R> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.order(b));
        sorted
    }
}

impl<'a, R> IntoIterator for &'a RecordSet<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

macro_rules! zone_record {
    ($t:ty $(, $target:ident)*) => {
        impl ZoneRecord for $t {
            fn name(&self) -> &str {
                &self.name
            }

            fn ttl(&self) -> Option<Duration> {
                self.ttl
            }

            fn set_ttl(&mut self, ttl: Option<Duration>) {
                self.ttl = ttl
            }

            fn canonicalize(&mut self, origin: &str) {
                self.name = canonical_name(origin, &self.name);
                $(self.$target = canonical_name(origin, &self.$target);)*
            }
        }

        impl $t {
            /// Sets the TTL override, None inherits the zone's default.
            pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
                self.ttl = ttl;
                self
            }
        }
    };
}

/// An absolute `name` (ending with a dot) inside `origin` made relative.
/// Relative names and names outside the zone are returned unchanged.
fn canonical_name(origin: &str, name: &str) -> String {
    match name.strip_suffix('.') {
        Some(absolute) => relative_to(origin, absolute),
        None => name.to_string(),
    }
}

/// `name` is absolute, without the trailing dot.
fn relative_to(origin: &str, name: &str) -> String {
    let name = name.to_lowercase();

    if name == origin {
        return "@".to_string();
    }

    match name.strip_suffix(origin) {
        Some(host) if host.ends_with('.') => host[..host.len() - 1].to_string(),
        _ => name + ".",
    }
}

fn normalize(field: &'static str, name: &str) -> Result<String> {
    validate_hostname(field, name)?;
    Ok(name.to_lowercase())
}

/// Address (A or AAAA) record.
#[derive(Clone, Debug, PartialEq)]
pub struct Address {
    pub name: String,
    pub ip: IpAddr,
    pub ttl: Option<Duration>,
}

impl Address {
    pub fn new(name: &str, ip: IpAddr) -> Result<Address> {
        Ok(Address {
            name: normalize("name", name)?,
            ip,
            ttl: None,
        })
    }
}

impl Keyed for Address {
    type Key = (String, IpAddr);

    fn key(&self) -> Self::Key {
        (self.name.clone(), self.ip)
    }

    fn update_from(&mut self, other: Self) {
        self.ttl = other.ttl;
    }

    fn order(&self, other: &Self) -> Ordering {
        (&self.name, self.ip).cmp(&(&other.name, other.ip))
    }
}

zone_record!(Address);

/// Canonical name (CNAME) record.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalName {
    pub name: String,
    pub target: String,
    pub ttl: Option<Duration>,
}

impl CanonicalName {
    pub fn new(name: &str, target: &str) -> Result<CanonicalName> {
        Ok(CanonicalName {
            name: normalize("name", name)?,
            target: normalize("target", target)?,
            ttl: None,
        })
    }

    pub fn fully_qualified_target(&self, zone: &Zone) -> String {
        zone.fqdn(&self.target)
    }
}

impl Keyed for CanonicalName {
    type Key = String;

    fn key(&self) -> Self::Key {
        self.name.clone()
    }

    fn update_from(&mut self, other: Self) {
        self.target = other.target;
        self.ttl = other.ttl;
    }

    fn order(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

zone_record!(CanonicalName, target);

/// Mail exchange (MX) record. `name` is the owner, normally "@".
#[derive(Clone, Debug, PartialEq)]
pub struct MailExchange {
    pub name: String,
    pub exchange: String,
    pub priority: u16,
    pub ttl: Option<Duration>,
}

impl MailExchange {
    /// A MX record at the zone apex.
    pub fn new(exchange: &str, priority: u16) -> Result<MailExchange> {
        Self::with_owner("@", exchange, priority)
    }

    pub fn with_owner(name: &str, exchange: &str, priority: u16) -> Result<MailExchange> {
        Ok(MailExchange {
            name: normalize("name", name)?,
            exchange: normalize("exchange", exchange)?,
            priority,
            ttl: None,
        })
    }

    pub fn fully_qualified_target(&self, zone: &Zone) -> String {
        zone.fqdn(&self.exchange)
    }
}

impl Keyed for MailExchange {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.name.clone(), self.exchange.clone())
    }

    fn update_from(&mut self, other: Self) {
        self.priority = other.priority;
        self.ttl = other.ttl;
    }

    fn order(&self, other: &Self) -> Ordering {
        (self.priority, &self.exchange, &self.name).cmp(&(
            other.priority,
            &other.exchange,
            &other.name,
        ))
    }
}

zone_record!(MailExchange, exchange);

/// Name server (NS) record. `name` is the owner, normally "@".
#[derive(Clone, Debug, PartialEq)]
pub struct NameServer {
    pub name: String,
    pub server: String,
    pub ttl: Option<Duration>,
}

impl NameServer {
    /// A NS record at the zone apex.
    pub fn new(server: &str) -> Result<NameServer> {
        Self::with_owner("@", server)
    }

    pub fn with_owner(name: &str, server: &str) -> Result<NameServer> {
        Ok(NameServer {
            name: normalize("name", name)?,
            server: normalize("server", server)?,
            ttl: None,
        })
    }

    pub fn fully_qualified_target(&self, zone: &Zone) -> String {
        zone.fqdn(&self.server)
    }
}

impl Keyed for NameServer {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.name.clone(), self.server.clone())
    }

    fn update_from(&mut self, other: Self) {
        self.ttl = other.ttl;
    }

    fn order(&self, other: &Self) -> Ordering {
        (&self.name, &self.server).cmp(&(&other.name, &other.server))
    }
}

zone_record!(NameServer, server);

/// Text (TXT) record. `text` keeps its surrounding double quotes.
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    pub name: String,
    pub text: String,
    pub ttl: Option<Duration>,
}

impl Text {
    pub fn new(name: &str, text: &str) -> Result<Text> {
        validate_text("text", text)?;

        Ok(Text {
            name: normalize("name", name)?,
            text: text.to_string(),
            ttl: None,
        })
    }

    /// The text without its quotes.
    pub fn unquoted(&self) -> &str {
        &self.text[1..self.text.len() - 1]
    }

    pub fn is_spf(&self) -> bool {
        self.text.starts_with(SPF_PREFIX)
    }
}

impl Keyed for Text {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.name.clone(), self.text.clone())
    }

    fn update_from(&mut self, other: Self) {
        self.ttl = other.ttl;
    }

    fn order(&self, other: &Self) -> Ordering {
        (&self.name, &self.text).cmp(&(&other.name, &other.text))
    }
}

zone_record!(Text);

/// Service (SRV) record.
#[derive(Clone, Debug, PartialEq)]
pub struct Service {
    pub name: String,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
    pub ttl: Option<Duration>,
}

impl Service {
    pub fn new(name: &str, priority: u16, weight: u16, port: u16, target: &str) -> Result<Service> {
        validate_service_name("name", name)?;
        if port == 0 {
            field_error!("port", "port must be between 1 and 65535");
        }

        Ok(Service {
            name: name.to_lowercase(),
            priority,
            weight,
            port,
            target: normalize("target", target)?,
            ttl: None,
        })
    }

    pub fn fully_qualified_target(&self, zone: &Zone) -> String {
        zone.fqdn(&self.target)
    }
}

impl Keyed for Service {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.name.clone(), self.target.clone())
    }

    fn update_from(&mut self, other: Self) {
        self.priority = other.priority;
        self.weight = other.weight;
        self.port = other.port;
        self.ttl = other.ttl;
    }

    fn order(&self, other: &Self) -> Ordering {
        (&self.name, self.priority, &self.target).cmp(&(
            &other.name,
            other.priority,
            &other.target,
        ))
    }
}

zone_record!(Service, target);

/// The SOA parameters and records for one delegated domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    /// Lower case, without the trailing dot.
    pub domain: String,

    pub serial: u32,
    pub refresh: Duration,
    pub retry: Duration,
    pub expire: Duration,
    pub minimum: Duration,

    /// The responsible party. Either a name relative to the zone
    /// ("hostmaster"), an absolute name, or an email address.
    pub soa_email: String,

    /// Default TTL for records without their own.
    pub ttl: Duration,

    pub addresses: RecordSet<Address>,
    pub canonical_names: RecordSet<CanonicalName>,
    pub mail_exchanges: RecordSet<MailExchange>,
    pub name_servers: RecordSet<NameServer>,
    pub texts: RecordSet<Text>,
    pub services: RecordSet<Service>,
}

impl Zone {
    /// Creates an empty zone with the SOA parameters taken from `defaults`.
    pub fn new(domain: &str, defaults: &ZoneDefaults) -> Result<Zone> {
        let domain = normalize_domain(domain)?;

        let mut zone = Zone {
            serial: 0,
            refresh: Duration::default(),
            retry: Duration::default(),
            expire: Duration::default(),
            minimum: Duration::default(),
            soa_email: String::new(),
            ttl: Duration::default(),
            addresses: RecordSet::new(&domain),
            canonical_names: RecordSet::new(&domain),
            mail_exchanges: RecordSet::new(&domain),
            name_servers: RecordSet::new(&domain),
            texts: RecordSet::new(&domain),
            services: RecordSet::new(&domain),
            domain,
        };
        zone.reset_defaults(defaults);

        Ok(zone)
    }

    /// Resets the SOA timers, default TTL and SOA email.
    pub fn reset_defaults(&mut self, defaults: &ZoneDefaults) {
        self.refresh = secs(defaults.refresh);
        self.retry = secs(defaults.retry);
        self.expire = secs(defaults.expire);
        self.minimum = secs(defaults.minimum);
        self.ttl = secs(defaults.ttl);
        self.soa_email = defaults.soa_email.clone();
    }

    /// The record's own TTL if set, else the zone default.
    pub fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or(self.ttl)
    }

    /// Makes `name` fully qualified, with a trailing dot.
    pub fn fqdn(&self, name: &str) -> String {
        if name.ends_with('.') {
            name.to_string()
        } else if name == "@" || name.is_empty() {
            format!("{}.", self.domain)
        } else {
            format!("{}.{}.", name, self.domain)
        }
    }

    /// Makes the absolute `name` (with or without the dot) relative to this
    /// zone, "@" for the apex. Names outside the zone stay absolute.
    pub fn relativize(&self, name: &str) -> String {
        relative_to(&self.domain, name.strip_suffix('.').unwrap_or(name))
    }

    /// The SOA RNAME, derived from `soa_email`.
    pub fn rname(&self) -> String {
        if self.soa_email.contains('@') {
            let rname = self.soa_email.replace('@', ".");
            match rname.ends_with('.') {
                true => rname,
                false => rname + ".",
            }
        } else {
            self.fqdn(&self.soa_email)
        }
    }

    /// Number of records, of all types.
    pub fn record_count(&self) -> usize {
        self.addresses.len()
            + self.canonical_names.len()
            + self.mail_exchanges.len()
            + self.name_servers.len()
            + self.texts.len()
            + self.services.len()
    }

    /// Sets the TTL of every record, returning how many were changed.
    pub fn set_record_ttls(&mut self, ttl: Option<Duration>) -> usize {
        fn set<R: ZoneRecord>(records: std::slice::IterMut<'_, R>, ttl: Option<Duration>) -> usize {
            let mut changed = 0;
            for record in records.filter(|r| r.ttl() != ttl) {
                record.set_ttl(ttl);
                changed += 1;
            }
            changed
        }

        set(self.addresses.iter_mut(), ttl)
            + set(self.canonical_names.iter_mut(), ttl)
            + set(self.mail_exchanges.iter_mut(), ttl)
            + set(self.name_servers.iter_mut(), ttl)
            + set(self.texts.iter_mut(), ttl)
            + set(self.services.iter_mut(), ttl)
    }
}

fn secs(secs: u32) -> Duration {
    Duration::from_secs(secs.into())
}

/// Lower cases the domain and strips the trailing dot.
pub(crate) fn normalize_domain(domain: &str) -> Result<String> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain == "@" {
        field_error!("domain", "domain must not be '@'");
    }
    validate_hostname("domain", domain)?;

    Ok(domain.to_lowercase())
}

/// The serial to save with, given the current one and today's date.
///
/// Today as `YYYYMMDD00` if that is larger, otherwise `current + 1`.
pub fn next_serial(current: u32, today: NaiveDate) -> u32 {
    let candidate = today.year() as u32 * 1_000_000 + today.month() * 10_000 + today.day() * 100;

    if candidate > current {
        candidate
    } else {
        current.wrapping_add(1)
    }
}
