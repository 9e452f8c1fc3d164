//! Settings, normally loaded from a YAML file.
//!
//! ```yaml
//! zone_defaults:
//!   expire: 604800
//!   soa_email: dns-admin
//! nameservers:
//!   - ns1.example.net.
//!   - ns2.example.net.
//! recipes: [google_apps, resave]
//! resolvers: ["192.0.2.53:53"]
//! delegation_timeout_secs: 2
//! ```
use crate::Error;
use crate::Result;
use derivative::Derivative;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// SOA parameters given to newly created zones, and by the
/// `reset_zone_defaults` recipe. All durations are in seconds.
#[derive(Clone, Debug, Deserialize, Derivative, PartialEq)]
#[derivative(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneDefaults {
    #[derivative(Default(value = "28800"))] // 8 hours
    pub refresh: u32,

    #[derivative(Default(value = "7200"))] // 2 hours
    pub retry: u32,

    #[derivative(Default(value = "2419200"))] // 4 weeks
    pub expire: u32,

    #[derivative(Default(value = "600"))] // 10 minutes
    pub minimum: u32,

    #[derivative(Default(value = "3600"))] // 1 hour
    pub ttl: u32,

    #[derivative(Default(value = "\"hostmaster\".to_string()"))]
    pub soa_email: String,
}

#[derive(Clone, Debug, Deserialize, Derivative, PartialEq)]
#[derivative(Default)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub zone_defaults: ZoneDefaults,

    /// The name servers a zone must be delegated to.
    #[derivative(Default(
        value = "vec![\"ns1.example.com.\".to_string(), \"ns2.example.com.\".to_string()]"
    ))]
    pub nameservers: Vec<String>,

    /// Identifiers of the recipes to offer.
    #[derivative(Default(value = "crate::recipes::ALL.iter().map(|s| s.to_string()).collect()"))]
    pub recipes: Vec<String>,

    /// Recursive servers used by the delegation check, as `ip` or `ip:port`.
    /// When empty the system's resolvers are used.
    pub resolvers: Vec<String>,

    #[derivative(Default(value = "5"))]
    pub delegation_timeout_secs: u64,
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Settings> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.check()?;
        Ok(settings)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let yaml = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("unable to read {}: {}", path.as_ref().display(), e))
        })?;

        Self::from_yaml(&yaml)
    }

    pub fn delegation_timeout(&self) -> Duration {
        Duration::from_secs(self.delegation_timeout_secs)
    }

    fn check(&self) -> Result<()> {
        if self.delegation_timeout_secs == 0 {
            return Err(Error::Config(
                "delegation_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.zone_defaults.ttl == 0 {
            return Err(Error::Config("zone_defaults.ttl must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_yaml("{}").expect("empty settings");
        assert_eq!(settings, Settings::default());

        assert_eq!(settings.zone_defaults.expire, 2419200);
        assert_eq!(settings.zone_defaults.soa_email, "hostmaster");
        assert_eq!(settings.nameservers, vec!["ns1.example.com.", "ns2.example.com."]);
        assert_eq!(settings.recipes.len(), 6);
        assert!(settings.resolvers.is_empty());
        assert_eq!(settings.delegation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "
zone_defaults:
  expire: 604800
  soa_email: dns-admin
nameservers:
  - ns1.example.net.
recipes: [google_apps]
resolvers: ['192.0.2.53:53']
delegation_timeout_secs: 2
";
        let settings = Settings::from_yaml(yaml).expect("valid settings");

        assert_eq!(settings.zone_defaults.expire, 604800);
        assert_eq!(settings.zone_defaults.refresh, 28800); // Untouched default
        assert_eq!(settings.zone_defaults.soa_email, "dns-admin");
        assert_eq!(settings.nameservers, vec!["ns1.example.net."]);
        assert_eq!(settings.recipes, vec!["google_apps"]);
        assert_eq!(settings.resolvers, vec!["192.0.2.53:53"]);
        assert_eq!(settings.delegation_timeout_secs, 2);
    }

    #[test]
    fn test_from_yaml_errors() {
        let tests = vec![
            "delegation_timeout_secs: 0",
            "zone_defaults: { ttl: 0 }",
            "nameserver: [ns1.example.net.]", // Typo
            "recipes: google_apps",          // Not a list
        ];

        for yaml in tests {
            match Settings::from_yaml(yaml) {
                Err(Error::Config(_)) => (),
                got => panic!("'{}' should be a config error, got {:?}", yaml, got),
            }
        }
    }
}
