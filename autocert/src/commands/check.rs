use std::path::Path;

use autocert_core::{CertificateRecord, RenewalDecision};
use time::OffsetDateTime;

use crate::config::RunConfig;
use crate::output;

/// `--check DOMAIN`: report one domain's certificate without acting on it.
///
/// Works for domains outside `DOMAINS`; they are judged against the default
/// threshold.
pub fn run(config_path: Option<&Path>, domain: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let domain = super::cli_domain(domain)?;
    let config = RunConfig::load(config_path)?;
    let store = super::store_for(&config);
    let threshold = config.threshold_for(&domain);

    let lookup = store.lookup(&domain);
    match &lookup {
        Ok(Some(record)) => {
            for line in describe(record, store.now()) {
                output::step(&line);
            }
        }
        Ok(None) => output::warning(&format!(
            "Certificate for domain {} does not exist under {}.",
            domain,
            store.cert_dir().display()
        )),
        Err(e) => output::error(&format!("Failed to check certificate: {}", e)),
    }

    let decision = RenewalDecision::evaluate(lookup.as_ref().map(Option::as_ref), threshold);
    output::muted(&format!("Renewal (threshold {} days): {}", threshold, decision));

    Ok(match decision {
        RenewalDecision::LookupError { .. } => 1,
        _ => 0,
    })
}

/// Human-readable status lines for one certificate.
pub fn describe(record: &CertificateRecord, now: OffsetDateTime) -> Vec<String> {
    if record.is_expired() {
        return vec![
            format!("Certificate for domain {} has expired.", record.domain),
            format!("Expired on: {}", record.expiry_display()),
        ];
    }

    let remaining = record.not_after - now;
    vec![
        format!("Certificate for domain {} exists.", record.domain),
        format!("Issuer: {}", record.issuer),
        format!("Expires on: {}", record.expiry_display()),
        format!(
            "Time remaining: {} days, {} hours, {} minutes",
            remaining.whole_days(),
            remaining.whole_hours() % 24,
            remaining.whole_minutes() % 60
        ),
    ]
}
