use crate::clients::udp::GOOGLE;
use crate::clients::Exchanger;
use crate::clients::NsResolver;
use crate::clients::TcpClient;
use crate::clients::UdpClient;
use crate::types::*;
use crate::Extension;
use crate::Message;
use log::debug;
use std::fs;
use std::io;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::time::Duration;

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// A stub resolver that asks a recursive server for a domain's name servers.
pub struct Resolver<E = UdpClient> {
    client: E,

    /// Used to retry when the answer from `client` was truncated.
    fallback: Option<TcpClient>,
}

impl Resolver {
    /// Creates a new Resolver using the system's DNS servers, as listed in
    /// `/etc/resolv.conf`, falling back to Google Public DNS.
    pub fn new(timeout: Duration) -> io::Result<Resolver<UdpClient>> {
        let servers = match fs::read_to_string(RESOLV_CONF) {
            Ok(conf) => parse_resolv_conf(&conf),
            Err(e) => {
                debug!("unable to read {}: {}", RESOLV_CONF, e);
                Vec::new()
            }
        };

        if servers.is_empty() {
            let google: Vec<String> = GOOGLE.iter().map(|s| s.to_string()).collect();
            return Resolver::with_servers(&google, timeout);
        }

        Resolver::with_servers(&servers, timeout)
    }

    /// Creates a new Resolver that asks the given `ip:port` (or bare ip) servers.
    pub fn with_servers(servers: &[String], timeout: Duration) -> io::Result<Resolver<UdpClient>> {
        let addrs = servers
            .iter()
            .map(|s| to_socket_addr(s))
            .collect::<io::Result<Vec<SocketAddr>>>()?;

        let client = UdpClient::new(&addrs[..])?.with_timeout(timeout);
        let fallback = TcpClient::new(&addrs[..])?.with_timeout(timeout);

        Ok(Resolver {
            client,
            fallback: Some(fallback),
        })
    }
}

impl<E> Resolver<E>
where
    E: Exchanger,
{
    pub fn new_with_client(client: E) -> Resolver<E> {
        Resolver {
            client,
            fallback: None,
        }
    }

    fn exchange(&self, query: &Message) -> io::Result<Message> {
        let response = self.client.exchange(query)?;

        match &self.fallback {
            Some(tcp) if response.tc => {
                debug!("truncated answer, retrying over tcp");
                tcp.exchange(query)
            }
            _ => Ok(response),
        }
    }
}

impl<E> NsResolver for Resolver<E>
where
    E: Exchanger,
{
    fn query_ns(&self, domain: &str) -> io::Result<Vec<String>> {
        let mut query = Message {
            id: rand::random(),
            rd: true,
            ..Default::default()
        };
        query.add_question(domain, Type::NS, Class::Internet)?;
        query.add_extension(Extension {
            payload_size: 4096, // Allow for bigger responses.

            ..Default::default()
        });

        let response = self.exchange(&query)?;

        match response.rcode {
            Rcode::NoError => (),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("query failed with rcode: {}", response.rcode),
                ))
            }
        };

        let servers: Vec<String> = response
            .answers
            .into_iter()
            .filter_map(|answer| match answer.resource {
                Resource::NS(name) => Some(name),
                _ => None, // Ignore other types
            })
            .collect();

        debug!("{}: got {} name servers", domain, servers.len());

        Ok(servers)
    }
}

/// Extracts the `nameserver` entries from a resolv.conf file.
fn parse_resolv_conf(conf: &str) -> Vec<String> {
    conf.lines()
        .map(|line| line.trim())
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("nameserver"), Some(server)) => Some(server.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Accepts "1.2.3.4", "1.2.3.4:53", "::1" or "[::1]:53".
fn to_socket_addr(server: &str) -> io::Result<SocketAddr> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }

    match server.parse::<IpAddr>() {
        Ok(ip) => Ok(SocketAddr::new(ip, 53)),
        Err(e) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid server '{}': {}", server, e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct MockClient {
        response: Message,
        queries: RefCell<Vec<Message>>,
    }

    impl Exchanger for MockClient {
        fn exchange(&self, query: &Message) -> io::Result<Message> {
            self.queries.borrow_mut().push(query.clone());
            let mut response = self.response.clone();
            response.id = query.id;
            Ok(response)
        }
    }

    fn ns(name: &str) -> Record {
        Record::new(
            "example.com",
            Class::Internet,
            Duration::from_secs(3600),
            Resource::NS(name.to_string()),
        )
    }

    #[test]
    fn test_query_ns() {
        let client = MockClient {
            response: Message {
                qr: QR::Response,
                answers: vec![
                    ns("ns1.example.com."),
                    Record::new(
                        "example.com",
                        Class::Internet,
                        Duration::from_secs(3600),
                        Resource::A("192.0.2.1".parse().unwrap()),
                    ),
                    ns("ns2.example.com."),
                ],
                ..Default::default()
            },
            queries: RefCell::new(Vec::new()),
        };

        let resolver = Resolver::new_with_client(client);
        let got = resolver.query_ns("example.com").expect("query failed");

        assert_eq!(got, vec!["ns1.example.com.", "ns2.example.com."]);

        let queries = resolver.client.queries.borrow();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].questions[0].r#type, Type::NS);
        assert!(queries[0].rd);
    }

    #[test]
    fn test_query_ns_rcode() {
        let client = MockClient {
            response: Message {
                qr: QR::Response,
                rcode: Rcode::NXDomain,
                ..Default::default()
            },
            queries: RefCell::new(Vec::new()),
        };

        let resolver = Resolver::new_with_client(client);
        let err = resolver.query_ns("missing.example").unwrap_err();
        assert_eq!(err.to_string(), "query failed with rcode: NXDomain");
    }

    #[test]
    fn test_parse_resolv_conf() {
        let conf = "# generated\nsearch lan\nnameserver 192.0.2.53\n; old\nnameserver 2001:db8::53\noptions edns0\n";
        assert_eq!(parse_resolv_conf(conf), vec!["192.0.2.53", "2001:db8::53"]);
    }

    #[test]
    fn test_to_socket_addr() {
        let tests = vec![
            ("192.0.2.1", "192.0.2.1:53"),
            ("192.0.2.1:5353", "192.0.2.1:5353"),
            ("2001:db8::1", "[2001:db8::1]:53"),
            ("[2001:db8::1]:54", "[2001:db8::1]:54"),
        ];

        for (input, want) in tests {
            let got = to_socket_addr(input).expect("failed to parse");
            assert_eq!(got.to_string(), want, "for {}", input);
        }

        assert!(to_socket_addr("dns.google").is_err());
    }
}
