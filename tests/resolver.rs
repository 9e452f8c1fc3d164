#[cfg(test)]
#[cfg(all(feature = "udp", feature = "tcp"))]
mod tests {
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::Arc;
    use zonemgr::clients::Exchanger;
    use zonemgr::clients::NsResolver;
    use zonemgr::clients::Resolver;
    use zonemgr::Message;
    use zonemgr::*;

    /// Answers every query with the same wire response.
    struct WireClient {
        response: &'static str,
    }

    impl Exchanger for WireClient {
        fn exchange(&self, query: &Message) -> io::Result<Message> {
            // The query must at least encode.
            query.to_vec()?;

            let buf = hex::decode(self.response)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            Message::from_slice(&buf)
        }
    }

    struct TimeoutClient;

    impl Exchanger for TimeoutClient {
        fn exchange(&self, _query: &Message) -> io::Result<Message> {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "no response"))
        }
    }

    // "example.com IN NS" with two answers, both compressed against the question.
    const TWO_NS: &str = concat!(
        "beef81800001000200000000",
        "076578616d706c6503636f6d00", // example.com
        "00020001",                   // NS IN
        "c00c0002000100000e100006036e7331c00c", // ns1.example.com.
        "c00c0002000100000e100006036e7332c00c", // ns2.example.com.
    );

    const ONE_NS: &str = concat!(
        "beef81800001000100000000",
        "076578616d706c6503636f6d00",
        "00020001",
        "c00c0002000100000e100006036e7331c00c",
    );

    // NXDOMAIN, no answers.
    const NX: &str = concat!(
        "beef81830001000000000000",
        "076578616d706c6503636f6d00",
        "00020001",
    );

    fn zone() -> Zone {
        Zone::new("example.com", &ZoneDefaults::default()).unwrap()
    }

    #[test]
    fn test_query_ns() {
        let resolver = Resolver::new_with_client(WireClient { response: TWO_NS });
        let got = resolver.query_ns("example.com").expect("query failed");
        assert_eq!(got, vec!["ns1.example.com.", "ns2.example.com."]);

        let resolver = Resolver::new_with_client(WireClient { response: NX });
        assert!(resolver.query_ns("example.com").is_err());
    }

    #[test]
    fn test_delegation() {
        struct TestCase {
            response: &'static str,
            want: Verdict,
        }

        let tests = vec![
            TestCase {
                response: TWO_NS,
                want: Verdict::Valid,
            },
            TestCase {
                response: ONE_NS,
                want: Verdict::Invalid("Zone has insufficient nameservers count: 1".to_string()),
            },
        ];

        for test in tests {
            let resolver = Resolver::new_with_client(WireClient {
                response: test.response,
            });
            let validator =
                Validator::new(&Settings::default(), resolver, Arc::new(MemoryCache::new()));

            assert_eq!(validator.is_delegated(&zone()), test.want);
        }
    }

    #[test]
    fn test_delegation_not_allowed() {
        let settings = Settings {
            nameservers: vec!["ns1.example.net.".to_string(), "ns2.example.net.".to_string()],
            ..Default::default()
        };
        let resolver = Resolver::new_with_client(WireClient { response: TWO_NS });
        let validator = Validator::new(&settings, resolver, Arc::new(MemoryCache::new()));

        assert_eq!(
            validator.check_delegation(&zone()),
            Verdict::Invalid(
                "Zone nameserver ns1.example.com. is not in the configured name servers"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_delegation_timeout() {
        let cache = Arc::new(MemoryCache::new());
        let validator = Validator::new(
            &Settings::default(),
            Resolver::new_with_client(TimeoutClient),
            cache.clone(),
        );

        let zone = zone();
        let verdict = validator.is_delegated(&zone);
        assert_eq!(verdict, Verdict::Invalid("timeout".to_string()));
        assert_eq!(
            cache.get("example.com", Check::Delegation, zone.serial),
            Some(verdict)
        );
    }
}
