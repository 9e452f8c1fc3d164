// Parses a Zone File following RFC 1035 (section 5).

use crate::zones::Entry;
use crate::zones::Record;
use crate::Class;
use crate::Resource;
use crate::MX;
use crate::SOA;
use crate::SRV;
use crate::TXT;
use pest_consume::match_nodes;
use pest_consume::Error;
use pest_consume::Parser;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser)]
#[grammar = "zones/zones.pest"]
pub(crate) struct ZoneParser;

type Result<T> = std::result::Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

/// Parses "3600", "1h" or "1w2d3h4m5s" into seconds.
fn parse_duration(s: &str) -> std::result::Result<u64, String> {
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }

    let mut total: u64 = 0;
    let mut value: u64 = 0;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(d.into()))
                .ok_or_else(|| format!("duration '{}' is too large", s))?;
            continue;
        }

        let unit = match c.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            'w' => 7 * 24 * 60 * 60,
            _ => return Err(format!("invalid duration unit '{}'", c)),
        };
        total = value
            .checked_mul(unit)
            .and_then(|v| v.checked_add(total))
            .ok_or_else(|| format!("duration '{}' is too large", s))?;
        value = 0;
    }

    Ok(total)
}

#[pest_consume::parser]
impl ZoneParser {
    fn EOI(input: Node) -> Result<()> {
        assert_eq!(input.as_rule(), Rule::EOI);
        Ok(())
    }

    fn ip4(input: Node) -> Result<Ipv4Addr> {
        assert_eq!(input.as_rule(), Rule::ip4);

        match Ipv4Addr::from_str(input.as_str()) {
            Ok(ip4) => Ok(ip4),
            Err(e) => Err(input.error(e)),
        }
    }

    fn ip6(input: Node) -> Result<Ipv6Addr> {
        assert_eq!(input.as_rule(), Rule::ip6);

        match Ipv6Addr::from_str(input.as_str()) {
            Ok(ip6) => Ok(ip6),
            Err(e) => Err(input.error(e)),
        }
    }

    fn duration(input: Node) -> Result<Duration> {
        assert_eq!(input.as_rule(), Rule::duration);

        let secs = parse_duration(input.as_str()).map_err(|e| input.error(e))?;
        if secs > u32::MAX.into() {
            return Err(input.error(format!("ttl {} does not fit in 32 bits", secs)));
        }
        Ok(Duration::from_secs(secs))
    }

    // A quoted character-string, returned without the quotes.
    fn string(input: Node) -> Result<String> {
        assert_eq!(input.as_rule(), Rule::string);

        let s = input.as_str();
        Ok(s[1..s.len() - 1].to_string())
    }

    fn word(input: Node) -> Result<String> {
        assert_eq!(input.as_rule(), Rule::word);

        Ok(input.as_str().to_string())
    }

    fn domain(input: Node) -> Result<&str> {
        assert_eq!(input.as_rule(), Rule::domain);

        Ok(input.as_str())
    }

    fn class(input: Node) -> Result<Class> {
        assert_eq!(input.as_rule(), Rule::class);

        match input.as_str().to_ascii_uppercase().parse() {
            Ok(class) => Ok(class),
            Err(e) => Err(input.error(e)),
        }
    }

    fn number<T: std::str::FromStr>(input: Node) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        assert_eq!(input.as_rule(), Rule::number);

        match input.as_str().parse() {
            Ok(i) => Ok(i),
            Err(e) => Err(input.error(e)),
        }
    }

    fn type_name(input: Node) -> Result<String> {
        assert_eq!(input.as_rule(), Rule::type_name);

        Ok(input.as_str().to_ascii_uppercase())
    }

    #[alias(resource)]
    fn resource_a(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_a);

        Ok(match_nodes!(input.into_children();
            [ip4(ip)] => Resource::A(ip),
        ))
    }

    #[alias(resource)]
    fn resource_aaaa(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_aaaa);

        Ok(match_nodes!(input.into_children();
            [ip6(ip)] => Resource::AAAA(ip),
        ))
    }

    #[alias(resource)]
    fn resource_cname(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_cname);

        Ok(match_nodes!(input.into_children();
            [domain(name)] => Resource::CNAME(name.to_string()),
        ))
    }

    #[alias(resource)]
    fn resource_ns(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_ns);

        Ok(match_nodes!(input.into_children();
            [domain(name)] => Resource::NS(name.to_string()),
        ))
    }

    #[alias(resource)]
    fn resource_mx(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_mx);

        Ok(match_nodes!(input.into_children();
            [number(preference), domain(exchange)] => Resource::MX(MX {
                preference,
                exchange: exchange.to_string()
            }),
        ))
    }

    #[alias(resource)]
    fn resource_ptr(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_ptr);

        Ok(match_nodes!(input.into_children();
            [domain(name)] => Resource::PTR(name.to_string()),
        ))
    }

    #[alias(resource)]
    fn resource_soa(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_soa);

        Ok(match_nodes!(input.into_children();
            [domain(mname), domain(rname), number(serial), duration(refresh), duration(retry), duration(expire), duration(minimum)] => Resource::SOA(SOA {
                mname: mname.to_string(),
                rname: rname.to_string(),
                serial, refresh, retry, expire, minimum
            }),
        ))
    }

    #[alias(resource)]
    fn resource_txt(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_txt);

        let mut txts = Vec::new();
        for node in input.into_children() {
            match node.as_rule() {
                Rule::string => txts.push(Self::string(node)?),
                Rule::word => txts.push(Self::word(node)?),
                rule => unreachable!("Unexpected rule in TXT: {:?}", rule),
            }
        }
        Ok(Resource::TXT(TXT(txts)))
    }

    #[alias(resource)]
    fn resource_srv(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_srv);

        Ok(match_nodes!(input.into_children();
            [number(priority), number(weight), number(port), domain(name)] => Resource::SRV(SRV {
                priority, weight, port,
                name: name.to_string(),
            }),
        ))
    }

    #[alias(resource)]
    fn resource_other(input: Node) -> Result<Resource> {
        assert_eq!(input.as_rule(), Rule::resource_other);

        // Only the type is kept, the rdata is not interpreted.
        match input.into_children().next() {
            Some(node) => Ok(Resource::Unknown(Self::type_name(node)?)),
            None => unreachable!("resource_other without a type"),
        }
    }

    #[alias(entry)]
    fn origin(input: Node) -> Result<Entry> {
        assert_eq!(input.as_rule(), Rule::origin);

        Ok(match_nodes!(input.into_children();
            [domain(d)] => Entry::Origin(d.to_string()),
        ))
    }

    #[alias(entry)]
    fn ttl(input: Node) -> Result<Entry> {
        assert_eq!(input.as_rule(), Rule::ttl);

        Ok(match_nodes!(input.into_children();
            [duration(ttl)] => Entry::TTL(ttl),
        ))
    }

    #[alias(entry)]
    fn record(input: Node) -> Result<Entry> {
        assert_eq!(input.as_rule(), Rule::record);

        let record = Self::parse_record(input)?;

        // Wrap in a Entry
        Ok(Entry::Record(record))
    }

    pub fn single_record(input: Node) -> Result<Record> {
        assert_eq!(input.as_rule(), Rule::single_record);

        match_nodes!(input.into_children();
            [record, _EOI] => Ok(Self::parse_record(record)?)
        )
    }

    pub fn file(input: Node) -> Result<Vec<Entry>> {
        assert_eq!(input.as_rule(), Rule::file);

        match_nodes!(input.into_children();
            [entry(entrys).., _EOI] => Ok(entrys.collect()),
        )
    }
}

impl ZoneParser {
    // parse_record does the heavy lifting parsing a single record entry.
    // This is in a seperate ZoneParser impl, due to limitations with
    // `#[pest_consume::parser]` which does not allow aliased methods to be
    // called, or used in match_nodes.
    fn parse_record(input: Node) -> Result<Record> {
        assert_eq!(input.as_rule(), Rule::record);

        let mut record = Record::default();
        let mut resource = None;

        // The owner, ttl and class may appear in either order, so match
        // the children one by one.
        for node in input.into_children() {
            let rule = node.as_rule();
            match rule {
                Rule::domain => {
                    assert!(record.name.is_none(), "record domain was set twice");

                    record.name = Some(Self::domain(node)?.to_string())
                }
                Rule::duration => {
                    if record.ttl.is_some() {
                        return Err(node.error("record ttl was set twice"));
                    }

                    record.ttl = Some(Self::duration(node)?)
                }
                Rule::class => {
                    assert!(record.class.is_none(), "record class was set twice");

                    record.class = Some(Self::class(node)?)
                }

                _ => {
                    // Rule::resource have many aliases, try one of them.
                    match Self::rule_alias(rule) {
                        AliasedRule::resource => {
                            assert!(resource.is_none(), "record resource was set twice");

                            resource = Some(Self::resource(node)?)
                        }

                        _ => panic!("Unexpected token: {:?} '{:?}'", rule, node.as_str()),
                    }
                }
            }
        }

        match resource {
            Some(resource) => record.resource = resource,
            None => unreachable!("grammar guarantees a resource"),
        }

        Ok(record)
    }
}
