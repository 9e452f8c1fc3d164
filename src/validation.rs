//! Structural and delegation checks of a [`Zone`].
//!
//! Neither check returns an error. An invalid zone is a normal state, and is
//! reported as a [`Verdict`] with a reason.
use crate::cache::Check;
use crate::cache::ValidationCache;
use crate::clients::NsResolver;
use crate::config::Settings;
use crate::zones;
use crate::Error;
use crate::Zone;
use log::{debug, warn};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The outcome of a check.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Valid,
    Invalid(String),

    /// Nothing failed, but part of the check was skipped.
    Unknown(String),
}

impl Verdict {
    /// True unless the verdict is [`Verdict::Invalid`].
    pub fn as_bool(&self) -> bool {
        !self.is_invalid()
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Verdict::Invalid(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid(reason) | Verdict::Unknown(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "valid"),
            Verdict::Invalid(reason) => write!(f, "invalid: {}", reason),
            Verdict::Unknown(reason) => write!(f, "unknown: {}", reason),
        }
    }
}

/// Checks the zone's own records.
///
/// The name server and address counts are only checked when both are
/// present, so a zone under construction is [`Verdict::Unknown`] rather than
/// invalid. A CNAME sharing a name with an A record, or text that fails to
/// parse once rendered, is always invalid.
pub fn check_structure(zone: &Zone) -> Verdict {
    let skipped = zone.name_servers.is_empty() || zone.addresses.is_empty();

    if !skipped {
        if zone.name_servers.len() < 2 {
            return Verdict::Invalid("You must assign at least two name servers.".to_string());
        }
        if zone.addresses.is_empty() {
            return Verdict::Invalid("You must assign at least one address record.".to_string());
        }
    }

    let aliases: HashSet<String> = zone
        .canonical_names
        .iter()
        .map(|c| zone.fqdn(&c.name))
        .collect();
    if zone
        .addresses
        .iter()
        .any(|a| aliases.contains(&zone.fqdn(&a.name)))
    {
        return Verdict::Invalid("Cannot have CNAME and A records with same hostname.".to_string());
    }

    match zones::parse(&zones::render(zone), &zone.domain) {
        Ok(_) => (),
        Err(Error::Syntax(msg)) => {
            return Verdict::Invalid(format!("Failed to parse zone file with: {}", msg))
        }
        Err(e) => return Verdict::Invalid(format!("Failed to parse zone file with: {}", e)),
    }

    if skipped {
        return Verdict::Unknown(
            "name server or address records are missing, so their counts were not checked"
                .to_string(),
        );
    }

    Verdict::Valid
}

fn normalize(server: &str) -> String {
    server.trim_end_matches('.').to_lowercase()
}

/// Runs the checks, caching their verdicts until the zone is invalidated.
pub struct Validator<R, C> {
    resolver: R,
    cache: Arc<C>,

    /// Normalized allow-list of name servers.
    nameservers: HashSet<String>,
}

impl<R, C> Validator<R, C>
where
    R: NsResolver,
    C: ValidationCache,
{
    pub fn new(settings: &Settings, resolver: R, cache: Arc<C>) -> Validator<R, C> {
        Validator {
            resolver,
            cache,
            nameservers: settings.nameservers.iter().map(|s| normalize(s)).collect(),
        }
    }

    /// The cached [`check_structure`].
    pub fn is_valid(&self, zone: &Zone) -> Verdict {
        self.cached(zone, Check::Validation, || check_structure(zone))
    }

    /// The cached [`Validator::check_delegation`].
    pub fn is_delegated(&self, zone: &Zone) -> Verdict {
        self.cached(zone, Check::Delegation, || self.check_delegation(zone))
    }

    /// Asks the resolver for the zone's name servers, and checks they are
    /// all in the allow-list, and that there are at least two.
    pub fn check_delegation(&self, zone: &Zone) -> Verdict {
        let servers = match self.resolver.query_ns(&zone.domain) {
            Ok(servers) => servers,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                return Verdict::Invalid("timeout".to_string())
            }
            Err(e) => {
                return Verdict::Invalid(format!("Exception during delegation check: {}", e))
            }
        };

        if let Some(server) = servers
            .iter()
            .find(|s| !self.nameservers.contains(&normalize(s)))
        {
            return Verdict::Invalid(format!(
                "Zone nameserver {} is not in the configured name servers",
                server
            ));
        }

        if servers.len() < 2 {
            return Verdict::Invalid(format!(
                "Zone has insufficient nameservers count: {}",
                servers.len()
            ));
        }

        Verdict::Valid
    }

    fn cached<F>(&self, zone: &Zone, check: Check, f: F) -> Verdict
    where
        F: FnOnce() -> Verdict,
    {
        if let Some(verdict) = self.cache.get(&zone.domain, check, zone.serial) {
            debug!("{}: cached {} verdict: {}", zone.domain, check, verdict);
            return verdict;
        }

        let generation = self.cache.begin(&zone.domain);
        let verdict = f();

        if verdict.is_invalid() {
            warn!("{}: {} {}", zone.domain, check, verdict);
        }

        self.cache
            .set(&zone.domain, check, generation, zone.serial, verdict.clone());
        verdict
    }
}
