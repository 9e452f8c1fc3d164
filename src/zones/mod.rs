//! Zone master file codec.
//!
//! Text is first turned into a [`File`], a list of unprocessed [`Entry`]s
//! where names such as "@" are not yet resolved and fields are optional.
//! [`parse`] resolves those into absolute records and [`render`] goes the
//! other way, from a [`crate::Zone`] back to text.
use crate::zones::parser::Rule;
use crate::zones::parser::ZoneParser;
use crate::zones::preprocessor::preprocess;
use crate::Class;
use crate::Error;
use crate::Resource;
use pest_consume::Parser;
use std::str::FromStr;
use std::time::Duration;
use strum_macros::Display;

mod import;
mod parser;
mod preprocessor;
mod process;
mod render;

pub use self::import::load_zone;
pub use self::import::parse;
pub use self::import::ParsedRecord;
pub use self::import::Counts;
pub use self::import::ImportOptions;
pub use self::import::ImportSummary;
pub use self::import::ZoneData;
pub use self::render::render;

/// A Zone File. This is the unprocessed version of the zone file
/// where domains such as "@" have not yet been resolved, and fields
/// are optional. To turn this into [`Vec<crate::Record>`] call
/// [`File::into_records`].
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    /// The origin as defined when creating the Zone File. This is different than
    /// a origin set within the zone file.
    ///
    /// This should always be a absolute domain, but we don't need the dot on the end.
    pub origin: Option<String>,

    /// The list of Entries within the Zone File.
    pub entries: Vec<Entry>,
}

impl File {
    pub fn new(origin: Option<String>, entries: Vec<Entry>) -> File {
        let origin = origin.map(|domain| match domain.strip_suffix('.') {
            Some(domain) => domain.to_owned(),
            None => domain,
        });

        File { origin, entries }
    }

    /// Returns the argument of the first `$TTL` directive.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::TTL(ttl) => Some(*ttl),
            _ => None,
        })
    }
}

impl FromStr for File {
    type Err = Error;

    /// Parse a full zone file.
    ///
    /// ```
    /// use zonemgr::Resource;
    /// use zonemgr::zones::{File, Entry, Record};
    /// use std::str::FromStr;
    ///
    /// let file = File::from_str("$ORIGIN example.com.\n www  A   192.0.2.1").unwrap();
    /// assert_eq!(file, File::new(None, vec![
    ///   Entry::Origin("example.com.".to_string()),
    ///   Entry::Record(Record {
    ///     name: None,
    ///     ttl: None,
    ///     class: None,
    ///     resource: Resource::A("192.0.2.1".parse().unwrap()),
    ///   }),
    /// ]));
    /// ```
    fn from_str(input_str: &str) -> Result<Self, Self::Err> {
        // DOS and old Mac line endings.
        let input_str = input_str.replace("\r\n", "\n").replace('\r', "\n");
        let input_str = preprocess(&input_str).map_err(syntax_error)?;

        let inputs = ZoneParser::parse(Rule::file, &input_str).map_err(syntax_error)?;
        let input = inputs.single().map_err(syntax_error)?;

        ZoneParser::file(input)
            .map(|x| File::new(None, x))
            .map_err(syntax_error)
    }
}

fn syntax_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Syntax(e.to_string())
}

/// Internal struct for capturing each entry.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Entry {
    Origin(String),
    TTL(Duration),
    Record(Record),
}

/// Very similar to a [`crate::Record`] but allows for
/// optional values. When parsing a full zone file
/// those options can be derived from previous entries.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub name: Option<String>,
    pub ttl: Option<Duration>,
    pub class: Option<Class>,
    pub resource: Resource,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            name: None,
            ttl: None,
            class: None,
            resource: Resource::Unknown(String::new()),
        }
    }
}

impl FromStr for Record {
    type Err = Error;

    /// Parse a single zone file resource record.
    ///
    /// For example:
    ///
    /// ```
    /// use zonemgr::Resource;
    /// use zonemgr::zones::Record;
    /// use std::str::FromStr;
    ///
    /// let record = Record::from_str("example.com.  A   192.0.2.1").unwrap();
    /// assert_eq!(record, Record {
    ///   name: Some("example.com.".to_string()),
    ///   ttl: None,
    ///   class: None,
    ///   resource: Resource::A("192.0.2.1".parse().unwrap()),
    /// });
    /// ```
    ///
    /// This function is mostly useful for test code, or quickly parsing a
    /// single record. Please prefer to use [`File::from_str`] to parse full files.
    fn from_str(input_str: &str) -> Result<Self, Self::Err> {
        let inputs = ZoneParser::parse(Rule::single_record, input_str).map_err(syntax_error)?;
        let input = inputs.single().map_err(syntax_error)?;
        ZoneParser::single_record(input).map_err(syntax_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MX, SOA, SRV, TXT};
    use pretty_assertions::assert_eq;

    fn record(name: Option<&str>, ttl: Option<u64>, class: Option<Class>, resource: Resource) -> Record {
        Record {
            name: name.map(|n| n.to_string()),
            ttl: ttl.map(Duration::from_secs),
            class,
            resource,
        }
    }

    #[test]
    fn test_parse_record() {
        let tests = vec![
            (
                "@ 3600 IN NS ns1.example.com.",
                record(Some("@"), Some(3600), Some(Class::Internet), Resource::NS("ns1.example.com.".to_string())),
            ),
            (
                "www IN 1h A 192.0.2.1",
                record(Some("www"), Some(3600), Some(Class::Internet), Resource::A("192.0.2.1".parse().unwrap())),
            ),
            (
                "www a 192.0.2.1 ; lower case type",
                record(Some("www"), None, None, Resource::A("192.0.2.1".parse().unwrap())),
            ),
            (
                " AAAA 2001:db8::1",
                record(None, None, None, Resource::AAAA("2001:db8::1".parse().unwrap())),
            ),
            (
                "@ MX 10 mail",
                record(Some("@"), None, None, Resource::MX(MX {
                    preference: 10,
                    exchange: "mail".to_string(),
                })),
            ),
            (
                "@ TXT \"v=spf1 -all\"",
                record(Some("@"), None, None, Resource::TXT(TXT::from("v=spf1 -all"))),
            ),
            (
                "@ TXT \"part one \" \"part two\"",
                record(Some("@"), None, None, Resource::TXT(TXT(vec![
                    "part one ".to_string(),
                    "part two".to_string(),
                ]))),
            ),
            (
                "_sip._tls 300 IN SRV 100 1 443 sipdir.online.lync.com.",
                record(Some("_sip._tls"), Some(300), Some(Class::Internet), Resource::SRV(SRV {
                    priority: 100,
                    weight: 1,
                    port: 443,
                    name: "sipdir.online.lync.com.".to_string(),
                })),
            ),
            (
                "example.com. IN SOA ns1.example.com. admin ( 2020010100 28800 7200 604800 600 )",
                record(Some("example.com."), None, Some(Class::Internet), Resource::SOA(SOA {
                    mname: "ns1.example.com.".to_string(),
                    rname: "admin".to_string(),
                    serial: 2020010100,
                    refresh: Duration::from_secs(28800),
                    retry: Duration::from_secs(7200),
                    expire: Duration::from_secs(604800),
                    minimum: Duration::from_secs(600),
                })),
            ),
            (
                "@ CAA 0 issue \"letsencrypt.org\"",
                record(Some("@"), None, None, Resource::Unknown("CAA".to_string())),
            ),
        ];

        for (input, want) in tests {
            match Record::from_str(input) {
                Ok(got) => assert_eq!(got, want, "incorrect result for '{}'", input),
                Err(err) => panic!("'{}' failed:\n{}", input, err),
            }
        }
    }

    #[test]
    fn test_parse_record_errors() {
        let tests = vec![
            "@ A 192.0.2",          // Short address
            "@ A not-an-ip",        // Known type with bad rdata
            "@ MX mail.example.com", // Missing preference
            "@ 1h 2h A 192.0.2.1",  // Two TTLs
            "@ 1x A 192.0.2.1",     // Unknown unit
        ];

        for input in tests {
            assert!(Record::from_str(input).is_err(), "'{}' should fail", input);
        }
    }

    #[test]
    fn test_parse_file() {
        let input = "$ORIGIN example.com.\r\n$TTL 1h\r\n@ SOA ns1 admin (\r\n 1 2 3 4 5 ) ; soa\r\n\r\n; a comment\r\nwww A 192.0.2.1\r\n";

        let file = File::from_str(input).expect("failed to parse");
        assert_eq!(file.default_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(file.entries.len(), 4);
        assert_eq!(file.entries[0], Entry::Origin("example.com.".to_string()));
    }

    #[test]
    fn test_parse_file_errors() {
        let tests = vec![
            "@ SOA ns1 admin ( 1 2 3 4 5",
            "$ORIGIN",
            "@ A 192.0.2.1 extra",
        ];

        for input in tests {
            match File::from_str(input) {
                Err(Error::Syntax(_)) => (),
                got => panic!("'{}' should be a syntax error, got {:?}", input, got),
            }
        }
    }
}
