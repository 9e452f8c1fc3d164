//! Field constraints shared by the record constructors.

use crate::field_error;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;

/// The SPF prefix, as stored (with its opening quote) in a [`crate::Text`].
pub const SPF_PREFIX: &str = "\"v=spf1";

const MAX_NAME_LEN: usize = 255;

lazy_static! {
    // A single label. Underscores are allowed for service style names, and a
    // lone "*" for wildcards.
    static ref LABEL: Regex =
        Regex::new(r"(?i)^(\*|[a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?)$").unwrap();

    // _service._proto, optionally followed by a host.
    static ref SERVICE: Regex =
        Regex::new(r"(?i)^_[a-z0-9-]{1,63}\._[a-z0-9-]{1,63}(\.(?P<host>.+))?$").unwrap();
}

/// Checks a owner or target name. "@" is the zone apex, and a single
/// trailing dot marks the name as absolute.
pub fn validate_hostname(field: &'static str, name: &str) -> Result<()> {
    if name == "@" {
        return Ok(());
    }

    if name.len() > MAX_NAME_LEN {
        field_error!(field, "'{}' is longer than {} characters", name, MAX_NAME_LEN);
    }

    let relative = name.strip_suffix('.').unwrap_or(name);
    if relative.is_empty() {
        field_error!(field, "name must not be empty");
    }

    for label in relative.split('.') {
        if !LABEL.is_match(label) {
            field_error!(
                field,
                "'{}' is not a valid hostname, label '{}' must be 1-63 letters, digits, '-' or '_' and not start or end with '-'",
                name,
                label
            );
        }
    }

    Ok(())
}

/// Checks a DNS-SD style service name, `_service._proto[.host]`.
pub fn validate_service_name(field: &'static str, name: &str) -> Result<()> {
    let relative = name.strip_suffix('.').unwrap_or(name);

    let caps = match SERVICE.captures(relative) {
        Some(caps) => caps,
        None => field_error!(field, "'{}' must match _service._proto[.host]", name),
    };

    match caps.name("host") {
        Some(host) => validate_hostname(field, host.as_str()),
        None => Ok(()),
    }
}

/// Checks a TXT value is wrapped in exactly one pair of double quotes.
pub fn validate_text(field: &'static str, text: &str) -> Result<()> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        field_error!(field, "text must start and end with '\"'");
    }

    if text.matches('"').count() != 2 {
        field_error!(field, "text must contain exactly two '\"'");
    }

    Ok(())
}
