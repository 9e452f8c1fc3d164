// Mail provider presets.

use crate::recipes::mixins::Preset;
use crate::recipes::{Apply, Context, Recipe};
use crate::CanonicalName;
use crate::MailExchange;
use crate::Result;
use crate::Service;
use crate::Text;
use crate::Zone;

/// Google Apps (G Suite) mail, and the service CNAMEs.
pub struct GoogleApps;

impl GoogleApps {
    pub fn preset() -> Result<Preset> {
        let cnames = ["calendar", "docs", "mail", "sites", "video"];
        let mxs = [
            (10, "aspmx.l.google.com."),
            (20, "alt1.aspmx.l.google.com."),
            (20, "alt2.aspmx.l.google.com."),
            (30, "aspmx2.googlemail.com."),
            (30, "aspmx3.googlemail.com."),
        ];

        Ok(Preset {
            mail_exchanges: Some(
                mxs.iter()
                    .map(|(priority, exchange)| MailExchange::new(exchange, *priority))
                    .collect::<Result<_>>()?,
            ),
            canonical_names: cnames
                .iter()
                .map(|name| CanonicalName::new(name, "ghs.googlehosted.com."))
                .collect::<Result<_>>()?,
            ..Default::default()
        })
    }
}

impl Recipe for GoogleApps {
    fn id(&self) -> &'static str {
        "google_apps"
    }

    fn description(&self) -> &'static str {
        "Set Google Apps MX / CNAME"
    }

    fn apply(&self, zone: &mut Zone, _ctx: &Context) -> Result<Apply> {
        Self::preset()?.apply(zone)?;
        Ok(Apply::Save)
    }
}

/// Office 365 mail, Lync and autodiscover.
pub struct Office365;

impl Office365 {
    /// The MX host is derived from the domain, "example.com" becomes
    /// "example-com.mail.protection.outlook.com.".
    pub fn preset(domain: &str) -> Result<Preset> {
        let exchange = format!("{}.mail.protection.outlook.com.", domain.replace('.', "-"));
        let cnames = [
            ("autodiscover", "autodiscover.outlook.com."),
            ("sip", "sipdir.online.lync.com."),
            ("lyncdiscover", "webdir.online.lync.com."),
            ("msoid", "clientconfig.microsoftonline-p.net."),
        ];

        Ok(Preset {
            mail_exchanges: Some(vec![MailExchange::new(&exchange, 0)?]),
            canonical_names: cnames
                .iter()
                .map(|(name, target)| CanonicalName::new(name, target))
                .collect::<Result<_>>()?,
            texts: vec![Text::new(
                "@",
                "\"v=spf1 include:spf.protection.outlook.com -all\"",
            )?],
            services: vec![
                Service::new("_sip._tls", 100, 1, 443, "sipdir.online.lync.com.")?,
                Service::new("_sipfederationtls._tcp", 100, 1, 5061, "sipfed.online.lync.com.")?,
            ],
            ..Default::default()
        })
    }
}

impl Recipe for Office365 {
    fn id(&self) -> &'static str {
        "office_365"
    }

    fn description(&self) -> &'static str {
        "Set Office 365 MX / CNAME / SPF / SRV"
    }

    fn apply(&self, zone: &mut Zone, _ctx: &Context) -> Result<Apply> {
        Self::preset(&zone.domain)?.apply(zone)?;
        Ok(Apply::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::tests::context;
    use crate::*;
    use pretty_assertions::assert_eq;

    fn zone() -> Zone {
        Zone::new("example.com", &ZoneDefaults::default()).unwrap()
    }

    #[test]
    fn test_google_apps() {
        let mut zone = zone();
        zone.mail_exchanges
            .insert(MailExchange::new("stray.example.net.", 5).unwrap())
            .unwrap();

        let store = MemoryStore::new(std::sync::Arc::new(MemoryCache::new()));
        let ctx = context(&store);

        assert_eq!(GoogleApps.apply(&mut zone, &ctx).unwrap(), Apply::Save);
        assert_eq!(zone.mail_exchanges.len(), 5);
        assert!(zone.canonical_names.len() >= 5);

        // Again, with nothing new.
        GoogleApps.apply(&mut zone, &ctx).unwrap();
        assert_eq!(zone.mail_exchanges.len(), 5);
        assert_eq!(zone.canonical_names.len(), 5);
    }

    #[test]
    fn test_office_365() {
        let mut zone = zone();
        let store = MemoryStore::new(std::sync::Arc::new(MemoryCache::new()));
        let ctx = context(&store);

        Office365.apply(&mut zone, &ctx).unwrap();
        Office365.apply(&mut zone, &ctx).unwrap();

        assert_eq!(zone.mail_exchanges.len(), 1);
        assert_eq!(zone.canonical_names.len(), 4);
        assert_eq!(zone.texts.len(), 1);
        assert_eq!(zone.services.len(), 2);

        let mx = zone.mail_exchanges.iter().next().unwrap();
        assert_eq!(mx.exchange, "example-com.mail.protection.outlook.com.");
        assert_eq!(mx.priority, 0);
    }
}
