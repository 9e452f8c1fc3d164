// Renders a Zone as a zone master file.

use crate::zone::ZoneRecord;
use crate::{Address, CanonicalName, MailExchange, NameServer, Service, Text};
use crate::Zone;
use std::fmt;
use std::time::Duration;

/// The most bytes in a single character-string.
const MAX_STRING_LEN: usize = 255;

/// Renders the zone as zone file text.
///
/// The output only depends on the zone's state. Sections are written in the
/// order NS, A, CNAME, MX, TXT then SRV, each sorted, and a record only gets a
/// TTL column when it overrides the zone's default.
///
/// ```
/// use zonemgr::{NameServer, Zone, ZoneDefaults};
///
/// let mut zone = Zone::new("example.com", &ZoneDefaults::default()).unwrap();
/// zone.name_servers.insert(NameServer::new("ns1.example.com.").unwrap()).unwrap();
///
/// let text = zonemgr::zones::render(&zone);
/// assert!(text.contains("$ORIGIN example.com."));
/// assert!(text.contains("@ IN NS ns1.example.com."));
/// ```
pub fn render(zone: &Zone) -> String {
    zone.to_string()
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mname = match self.name_servers.sorted().first() {
            Some(ns) => ns.fully_qualified_target(self),
            None => format!("ns1.{}.", self.domain),
        };

        writeln!(f, "$ORIGIN .")?;
        writeln!(f, "$TTL {}", self.ttl.as_secs())?;
        writeln!(f, "{}. IN SOA {} {} (", self.domain, mname, self.rname())?;
        writeln!(f, "    {:<12} ; serial", self.serial)?;
        writeln!(f, "    {:<12} ; refresh", self.refresh.as_secs())?;
        writeln!(f, "    {:<12} ; retry", self.retry.as_secs())?;
        writeln!(f, "    {:<12} ; expire", self.expire.as_secs())?;
        writeln!(f, "    {:<12} ; minimum", self.minimum.as_secs())?;
        writeln!(f, ")")?;
        writeln!(f, "$ORIGIN {}.", self.domain)?;

        section(f, "Name Servers", self.name_servers.sorted(), "NS", |ns: &NameServer| {
            ns.fully_qualified_target(self)
        })?;
        section(f, "Addresses", self.addresses.sorted(), "A", |a: &Address| a.ip.to_string())?;
        section(f, "Canonical Names", self.canonical_names.sorted(), "CNAME", |c: &CanonicalName| {
            c.fully_qualified_target(self)
        })?;
        section(f, "Mail Exchanges", self.mail_exchanges.sorted(), "MX", |mx: &MailExchange| {
            format!("{} {}", mx.priority, mx.fully_qualified_target(self))
        })?;
        section(f, "Text", self.texts.sorted(), "TXT", character_strings)?;
        section(f, "Services", self.services.sorted(), "SRV", |srv: &Service| {
            format!(
                "{} {} {} {}",
                srv.priority,
                srv.weight,
                srv.port,
                srv.fully_qualified_target(self)
            )
        })?;

        Ok(())
    }
}

fn section<R, F>(
    f: &mut fmt::Formatter,
    title: &str,
    records: Vec<&R>,
    r#type: &str,
    rdata: F,
) -> fmt::Result
where
    R: ZoneRecord,
    F: Fn(&R) -> String,
{
    if records.is_empty() {
        return Ok(());
    }

    writeln!(f)?;
    writeln!(f, "; {}", title)?;

    for record in records {
        let data = rdata(record);

        // AAAA share the A section.
        let r#type = if r#type == "A" && data.contains(':') {
            "AAAA"
        } else {
            r#type
        };

        writeln!(
            f,
            "{}{} IN {} {}",
            record.name(),
            ttl_column(record.ttl()),
            r#type,
            data
        )?;
    }

    Ok(())
}

fn ttl_column(ttl: Option<Duration>) -> String {
    match ttl {
        Some(ttl) => format!(" {}", ttl.as_secs()),
        None => String::new(),
    }
}

/// Quotes the text, split into character-strings of at most 255 bytes.
///
/// Lengths are counted as sent on the wire, so an escape such as `\\` or
/// `\065` is a single byte, and a string never ends inside one.
fn character_strings(txt: &Text) -> String {
    let text = txt.unquoted();
    let mut strings = Vec::new();
    let mut start = 0;
    let mut len = 0;

    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let size = match c {
            '\\' => match chars.next() {
                Some((_, d)) if d.is_ascii_digit() => {
                    // \DDD
                    for _ in 0..2 {
                        chars.next_if(|&(_, d)| d.is_ascii_digit());
                    }
                    1
                }
                Some((_, x)) => x.len_utf8(),
                None => 1,
            },
            c => c.len_utf8(),
        };

        if len + size > MAX_STRING_LEN {
            strings.push(&text[start..i]);
            start = i;
            len = 0;
        }
        len += size;
    }
    strings.push(&text[start..]);

    strings
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<String>>()
        .join(" ")
}
