//! Domain and certificate records

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use time::macros::format_description;

const SECONDS_PER_DAY: i64 = 86_400;

/// Renewal threshold used when neither the domain nor the config sets one.
pub const DEFAULT_THRESHOLD_DAYS: u32 = 30;

/// A domain managed by autocert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name, also the certificate lineage name in the CA client's store
    pub name: String,
    /// Renew once the certificate has this many days or fewer left
    pub threshold_days: u32,
}

impl DomainConfig {
    pub fn new(name: impl Into<String>, threshold_days: u32) -> Self {
        Self {
            name: name.into(),
            threshold_days,
        }
    }
}

/// Certificate details read from the CA client's store.
///
/// Records are derived at inspection time and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub domain: String,
    pub issuer: String,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    /// Whole days left at inspection time, floored (negative once expired)
    pub days_remaining: i64,
    /// Certificate file the record was read from
    pub path: PathBuf,
}

impl CertificateRecord {
    pub fn is_expired(&self) -> bool {
        self.days_remaining < 0
    }

    /// Expiry date rendered for tables and status output.
    pub fn expiry_display(&self) -> String {
        format_utc(self.not_after)
    }
}

/// Whole days from `now` until `not_after`, floored.
///
/// A certificate expiring in 23 hours has 0 days left; one that expired an hour
/// ago has -1.
pub fn days_remaining(not_after: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let remaining = not_after - now;
    let mut seconds = remaining.whole_seconds();
    // whole_seconds truncates toward zero; a sub-second overrun still counts as expired
    if remaining.subsec_nanoseconds() < 0 {
        seconds -= 1;
    }
    seconds.div_euclid(SECONDS_PER_DAY)
}

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_utc(at: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let utc = at.to_offset(time::UtcOffset::UTC);
    match utc.format(&fmt) {
        Ok(s) => format!("{} UTC", s),
        Err(_) => utc.to_string(),
    }
}

/// Validate a domain name as accepted in configuration.
///
/// Names double as directory names in the CA client's store, so anything that
/// could escape that directory is rejected along with non-hostname characters.
/// Wildcards are rejected too: HTTP-01 webroot validation cannot issue them.
pub fn validate_domain_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("domain name must not be empty".to_string());
    }
    if name.len() > 253 {
        return Err(format!("domain name '{}' is longer than 253 characters", name));
    }
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return Err(format!("domain name '{}' has an empty label", name));
    }

    if name.contains('*') {
        return Err(format!(
            "domain name '{}' is a wildcard; HTTP-01 validation cannot issue wildcard certificates",
            name
        ));
    }

    for label in name.split('.') {
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!(
                "domain name '{}' has a label starting or ending with '-'",
                name
            ));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!("domain name '{}' contains invalid characters", name));
        }
    }

    Ok(())
}
