#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use zonemgr::zones;
    use zonemgr::*;

    const SCENARIO: &str = "$ORIGIN .
$TTL 3600
example.com. IN SOA ns1.example.com. admin ( 2020010100 28800 7200 604800 600 )
$ORIGIN example.com.
@ 3600 IN NS ns1.example.com.
@ 3600 IN NS ns2.example.com.
@ 3600 IN A 10.0.0.1
";

    // Mixed case, relative and absolute names, overrides and continuations.
    const MESSY: &str = "$ORIGIN Example.COM.
$TTL 300
@ IN SOA ns1 hostmaster (
    2021030401 ; serial
    3600 600 86400 300 )
@ NS ns1
@ NS NS2.example.com.
@ A 192.0.2.1
WWW 60 IN A 192.0.2.2
www AAAA 2001:db8::2
@ MX 10 mail
@ MX 20 mx.example.net.
mail CNAME ghs.googlehosted.com.
@ TXT \"v=spf1 \" \"mx -all\"
_sip._tcp 600 SRV 10 60 5060 sip.example.net.
";

    fn zone() -> Zone {
        Zone::new("example.com", &ZoneDefaults::default()).unwrap()
    }

    fn import(text: &str) -> Zone {
        let mut zone = zone();
        zone.update_from_text(text, false).expect("failed to import");
        zone
    }

    /// Records (excluding the SOA) in a comparable form.
    fn records(text: &str) -> Vec<String> {
        let data = zones::parse(text, "example.com").expect("failed to parse");
        let mut got: Vec<String> = data
            .records
            .iter()
            .map(|parsed| {
                let r = &parsed.record;
                match &r.resource {
                    // Character-string boundaries are not kept.
                    Resource::TXT(txt) => {
                        format!("{} {} TXT {}", r.name, r.ttl.as_secs(), txt.joined())
                    }
                    resource => format!("{} {} {:?}", r.name, r.ttl.as_secs(), resource),
                }
            })
            .collect();
        got.sort();
        got
    }

    #[test]
    fn test_round_trip() {
        let zone = import(SCENARIO);
        let text = zones::render(&zone);

        assert_eq!(records(&text), records(SCENARIO));

        let data = zones::parse(&text, "example.com").unwrap();
        let (owner, soa) = data.soa.expect("missing SOA");
        assert_eq!(owner, "example.com");
        assert_eq!(soa.serial, 2020010100);
        assert_eq!(soa.expire, Duration::from_secs(604800));
        assert_eq!(soa.mname, "ns1.example.com");
    }

    #[test]
    fn test_round_trip_ttls() {
        let mut zone = zone();
        let ttl = zone.ttl;
        let tests = vec![
            ("pinned", "192.0.2.1", Some(ttl)),
            ("inherited", "192.0.2.2", None),
            ("short", "192.0.2.3", Some(Duration::from_secs(60))),
        ];
        for (name, ip, ttl) in &tests {
            zone.addresses
                .insert(Address::new(name, ip.parse().unwrap()).unwrap().with_ttl(*ttl))
                .unwrap();
        }

        let got = import(&zones::render(&zone));
        for (name, ip, ttl) in tests {
            let key: (String, std::net::IpAddr) = (name.to_string(), ip.parse().unwrap());
            let address = got.addresses.get(&key).expect("missing address");
            assert_eq!(address.ttl, ttl, "wrong TTL for {}", name);
        }
    }

    #[test]
    fn test_round_trip_absolute_names() {
        let mut zone = zone();
        zone.addresses
            .insert(Address::new("www.example.com.", "192.0.2.1".parse().unwrap()).unwrap())
            .unwrap();
        zone.mail_exchanges
            .insert(MailExchange::new("Mail.Example.com.", 10).unwrap())
            .unwrap();

        let got = import(&zones::render(&zone));
        assert_eq!(got.addresses, zone.addresses);
        assert_eq!(got.mail_exchanges, zone.mail_exchanges);
    }

    #[test]
    fn test_render_is_stable() {
        let once = zones::render(&import(MESSY));
        let twice = zones::render(&import(&once));

        assert_eq!(once, twice);
        assert_eq!(records(&once), records(MESSY));
    }

    #[test]
    fn test_messy_import() {
        let zone = import(MESSY);

        assert_eq!(zone.serial, 2021030401);
        assert_eq!(zone.ttl, Duration::from_secs(300));
        assert_eq!(zone.soa_email, "hostmaster");
        assert_eq!(zone.name_servers.len(), 2);
        assert_eq!(zone.addresses.len(), 3);
        assert_eq!(zone.services.len(), 1);

        let text = zones::render(&zone);
        assert!(text.contains("\nwww 60 IN A 192.0.2.2\n"), "{}", text);
        assert!(text.contains("\nwww IN AAAA 2001:db8::2\n"), "{}", text);
        assert!(text.contains("\n@ IN TXT \"v=spf1 mx -all\"\n"), "{}", text);
        assert!(
            text.contains("\n_sip._tcp 600 IN SRV 10 60 5060 sip.example.net.\n"),
            "{}",
            text
        );
        assert_eq!(check_structure(&zone), Verdict::Valid);
    }

    #[test]
    fn test_absent_records() {
        let zone = import("$ORIGIN example.com.\n$TTL 60\n");

        assert_eq!(zone.record_count(), 0);
        assert!(check_structure(&zone).as_bool());

        let text = zones::render(&zone);
        assert!(zones::parse(&text, "example.com").is_ok(), "{}", text);
    }

    #[test]
    fn test_cname_conflict() {
        let zone = import(&format!("{}www A 10.0.0.2\nwww CNAME example.com.\n", SCENARIO));

        let verdict = check_structure(&zone);
        assert!(verdict.is_invalid());
        assert_eq!(
            verdict.reason(),
            Some("Cannot have CNAME and A records with same hostname.")
        );
    }

    #[test]
    fn test_second_soa() {
        let text = format!(
            "{}@ IN SOA ns1 admin ( 1 2 3 4 5 )\n",
            SCENARIO
        );
        assert!(matches!(
            zones::parse(&text, "example.com"),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_load_zone() {
        let store = MemoryStore::new(Arc::new(MemoryCache::new()));
        let defaults = ZoneDefaults::default();
        let strict = ImportOptions {
            strict_origin: true,
            ..Default::default()
        };

        // Not in the store yet.
        assert!(matches!(
            load_zone(&store, &defaults, "example.com", SCENARIO, strict),
            Err(Error::NoOrigin(_))
        ));

        // But fine for a preview.
        let (zone, summary) =
            load_zone(&store, &defaults, "example.com", SCENARIO, ImportOptions::default())
                .unwrap();
        assert_eq!(summary.created(), 3);
        assert!(store.get("example.com").unwrap().is_none());

        store.save(&mut zone.clone()).unwrap();

        let (zone, _) = load_zone(&store, &defaults, "example.com", SCENARIO, strict).unwrap();
        assert_eq!(zone.name_servers.len(), 2);

        // The SOA must belong to the zone.
        let other = SCENARIO.replace("example.com. IN SOA", "example.org. IN SOA");
        assert!(matches!(
            load_zone(&store, &defaults, "example.com", &other, strict),
            Err(Error::NoOrigin(_))
        ));

        let no_soa = "$ORIGIN example.com.\n$TTL 60\n@ A 10.0.0.1\n";
        assert!(matches!(
            load_zone(&store, &defaults, "example.com", no_soa, strict),
            Err(Error::NoOrigin(_))
        ));
    }
}
