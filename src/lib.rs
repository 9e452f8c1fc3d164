//! Authoritative DNS zone management.
//!
//! A [`Zone`] owns typed records (A/AAAA, CNAME, MX, NS, TXT and SRV), which
//! can be loaded from and rendered to zone master files ([`zones`]), checked
//! for consistency and delegation ([`validation`]), and changed by named
//! [`recipes`].
//!
//! ```rust
//! use zonemgr::{check_structure, Verdict, Zone, ZoneDefaults};
//!
//! let text = "$ORIGIN example.com.\n$TTL 3600\n\
//!     @ IN SOA ns1 hostmaster ( 2021030400 28800 7200 2419200 600 )\n\
//!     @ IN NS ns1.example.com.\n\
//!     @ IN NS ns2.example.com.\n\
//!     www IN A 192.0.2.1\n";
//!
//! let mut zone = Zone::new("example.com", &ZoneDefaults::default()).unwrap();
//! zone.update_from_text(text, false).unwrap();
//!
//! assert_eq!(zone.name_servers.len(), 2);
//! assert_eq!(check_structure(&zone), Verdict::Valid);
//! ```
pub mod cache;
pub mod clients;
pub mod config;
mod dns;
mod errors;
pub mod fields;
mod io;
pub mod recipes;
pub mod store;
pub mod types;
pub mod validation;
mod zone;
pub mod zones;

#[macro_use]
extern crate num_derive;

pub use crate::types::*;

#[doc(inline)]
pub use crate::errors::{Error, Result};

// The zone model.
#[doc(inline)]
pub use crate::zone::{
    next_serial, Address, CanonicalName, Keyed, MailExchange, NameServer, RecordSet, Service,
    Text, Upsert, Zone, ZoneRecord,
};

#[doc(inline)]
pub use crate::cache::{Check, MemoryCache, ValidationCache};
#[doc(inline)]
pub use crate::config::{Settings, ZoneDefaults};
#[doc(inline)]
pub use crate::recipes::{Apply, Recipe, Registry};
#[doc(inline)]
pub use crate::store::{MemoryStore, Store};
#[doc(inline)]
pub use crate::validation::{check_structure, Validator, Verdict};
#[doc(inline)]
pub use crate::zones::{load_zone, render, ImportOptions, ImportSummary};
