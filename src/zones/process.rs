// Process a Zone File turning it into actual Records.

use crate::zones::Entry;
use crate::zones::File;
use crate::Class;
use crate::Error;
use crate::Record;
use crate::Resource;
use crate::Result;
use crate::MX;
use crate::SOA;
use crate::SRV;
use std::time::Duration;

impl File {
    /// Resolves every entry into an absolute [`Record`].
    ///
    /// Names are returned lower case and without the trailing dot. A record
    /// without a TTL takes the `$TTL`, else the TTL of the previous record.
    pub fn into_records(self) -> Result<Vec<Record>> {
        let mut results = Vec::<Record>::new();

        // Useful to refer to:
        // https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
        // https://datatracker.ietf.org/doc/html/rfc2308#section-4

        let mut origin: Option<String> = self.origin;
        let mut default_ttl: Option<Duration> = None;

        let mut last_name: Option<String> = None;
        let mut last_ttl: Option<Duration> = None;
        let mut last_class: Option<Class> = None;

        for entry in self.entries {
            match entry {
                Entry::Origin(new_origin) => {
                    // "$ORIGIN ." is the root, which we keep as "".
                    origin = Some(match new_origin.strip_suffix('.') {
                        Some(new_origin) => new_origin.to_lowercase(),
                        None => match origin.as_deref() {
                            Some(current) => resolve_name(&new_origin, Some(current))?,
                            None => {
                                return Err(Error::Syntax(format!(
                                    "$ORIGIN '{}' is relative, and there is no origin to resolve it against",
                                    new_origin
                                )))
                            }
                        },
                    });
                }
                Entry::TTL(ttl) => default_ttl = Some(ttl),
                Entry::Record(record) => {
                    let full_name = match record.name.as_deref() {
                        Some(name) => resolve_name(name, origin.as_deref())?,
                        None => match last_name {
                            Some(name) => name,
                            None => {
                                return Err(Error::Syntax(
                                    "record without a name, and no previous record to take it from"
                                        .to_string(),
                                ))
                            }
                        },
                    };
                    last_name = Some(full_name.clone());

                    let ttl = match record.ttl.or(default_ttl).or(last_ttl) {
                        Some(ttl) => ttl,
                        None => {
                            return Err(Error::Syntax(format!(
                                "record '{}' has no TTL, and no $TTL or previous TTL is set",
                                full_name
                            )))
                        }
                    };
                    last_ttl = Some(ttl);

                    let class = record.class.or(last_class).unwrap_or_default();
                    last_class = Some(class);

                    results.push(Record {
                        name: full_name,
                        class,
                        ttl,
                        resource: resolve_resource(record.resource, origin.as_deref())?,
                    })
                }
            }
        }

        Ok(results)
    }
}

fn resolve_name(name: &str, origin: Option<&str>) -> Result<String> {
    let name = name.to_lowercase();

    // Absolute domain name
    if let Some(name) = name.strip_suffix('.') {
        return Ok(name.to_string());
    }

    // Everything past here requires a origin
    let origin = match origin {
        Some(origin) => origin,
        None => {
            return Err(Error::Syntax(format!(
                "relative name '{}' without a $ORIGIN",
                name
            )))
        }
    };

    if name == "@" {
        return Ok(origin.to_string());
    }

    if origin.is_empty() {
        return Ok(name);
    }

    // Relative domain name
    Ok(name + "." + origin)
}

fn resolve_resource(resource: Resource, origin: Option<&str>) -> Result<Resource> {
    Ok(match resource {
        // These types don't include a domain, so keep as is.
        Resource::A(_) | Resource::AAAA(_) | Resource::TXT(_) | Resource::Unknown(_) => resource,

        // The rest need some kind of tweaking
        Resource::CNAME(domain) => Resource::CNAME(resolve_name(&domain, origin)?),
        Resource::NS(domain) => Resource::NS(resolve_name(&domain, origin)?),
        Resource::PTR(domain) => Resource::PTR(resolve_name(&domain, origin)?),
        Resource::MX(mx) => Resource::MX(MX {
            preference: mx.preference,
            exchange: resolve_name(&mx.exchange, origin)?,
        }),
        Resource::SOA(soa) => Resource::SOA(SOA {
            mname: resolve_name(&soa.mname, origin)?,
            rname: resolve_name(&soa.rname, origin)?,
            ..soa
        }),
        Resource::SRV(srv) => Resource::SRV(SRV {
            name: resolve_name(&srv.name, origin)?,
            ..srv
        }),
    })
}

#[cfg(test)]
mod tests {
    use crate::zones::File;
    use crate::Class;
    use crate::Error;
    use crate::Record;
    use crate::Resource;
    use crate::{MX, SOA};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_into_records() {
        let tests = vec![
    		("
$ORIGIN example.com.     ; designates the start of this zone file in the namespace
$TTL 3600                ; default expiration time of all RRs without their own TTL value
example.com.  IN  SOA   ns.example.com. username.example.com. ( 2020091025 7200 3600 1209600 3600 )
example.com.  IN  NS    ns                    ; ns.example.com is a nameserver for example.com
example.com.  IN  NS    ns.somewhere.example. ; ns.somewhere.example is a backup nameserver for example.com
@             IN  MX    20 Mail2.Example.com. ; '@' represents zone origin
@         300 IN  MX    50 mail3              ; using a relative host name
example.com.  IN  A     192.0.2.1             ; IPv4 address for example.com
              IN  AAAA  2001:db8:10::1        ; IPv6 address for example.com
www           IN  CNAME example.com.          ; www.example.com is an alias for example.com
",
            vec![
            	Record::new("example.com", Class::Internet, Duration::new(3600, 0), Resource::SOA(SOA {
	                mname: "ns.example.com".to_string(),
	                rname: "username.example.com".to_string(),
	                serial: 2020091025,
	                refresh: Duration::new(7200, 0),
	                retry: Duration::new(3600, 0),
	                expire: Duration::new(1209600, 0),
	                minimum: Duration::new(3600, 0),
	            })),
            	Record::new("example.com", Class::Internet, Duration::new(3600, 0), Resource::NS("ns.example.com".to_string())),
            	Record::new("example.com", Class::Internet, Duration::new(3600, 0), Resource::NS("ns.somewhere.example".to_string())),
				Record::new("example.com", Class::Internet, Duration::new(3600, 0), Resource::MX(MX{
					preference: 20,
					exchange: "mail2.example.com".to_string()
				})),
				Record::new("example.com", Class::Internet, Duration::new(300, 0), Resource::MX(MX{
					preference: 50,
					exchange: "mail3.example.com".to_string()
				})),
				Record::new("example.com", Class::Internet, Duration::new(3600, 0), Resource::A("192.0.2.1".parse().unwrap())),
				Record::new("example.com", Class::Internet, Duration::new(3600, 0), Resource::AAAA("2001:db8:10::1".parse().unwrap())),
				Record::new("www.example.com", Class::Internet, Duration::new(3600, 0), Resource::CNAME("example.com".to_string())),
            ]),
            // Root origin, and TTLs carried over from the previous record.
            ("$ORIGIN .\nexample.com. 60 IN A 192.0.2.1\nwww.example.com. IN A 192.0.2.2\n", vec![
                Record::new("example.com", Class::Internet, Duration::new(60, 0), Resource::A("192.0.2.1".parse().unwrap())),
                Record::new("www.example.com", Class::Internet, Duration::new(60, 0), Resource::A("192.0.2.2".parse().unwrap())),
            ]),
    	];

        for (input, want) in tests {
            match File::from_str(input)
                .expect("failed to parse")
                .into_records()
            {
                Ok(got) => assert_eq!(got, want),
                Err(err) => panic!("{} Failed:\n{}", input, err),
            }
        }
    }

    #[test]
    fn test_into_records_errors() {
        let tests = vec![
            // No TTL anywhere
            "$ORIGIN example.com.\n@ IN A 192.0.2.1\n",
            // Relative name without an origin
            "$TTL 60\nwww IN A 192.0.2.1\n",
            // Blank owner on the first record
            "$ORIGIN example.com.\n$TTL 60\n  IN A 192.0.2.1\n",
        ];

        for input in tests {
            let file = File::from_str(input).expect("failed to parse");
            match file.into_records() {
                Err(Error::Syntax(_)) => (),
                got => panic!("'{}' should be a syntax error, got {:?}", input, got),
            }
        }
    }
}
