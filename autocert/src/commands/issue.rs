use std::path::Path;

use autocert_core::{DomainConfig, DomainDecision, DueReason, RenewalDecision, RunSummary};

use crate::config::RunConfig;
use crate::output;
use crate::renew::{CaClient, Reloader, Renewer};
use crate::store::CertStore;

/// `--issue DOMAIN`: obtain a certificate now, whatever its expiry.
pub fn run(
    config_path: Option<&Path>,
    domain: &str,
    dry_run: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let domain = super::cli_domain(domain)?;
    let config = RunConfig::load(config_path)?;

    let store = super::store_for(&config);
    let ca = super::certbot_for(&config);
    let reloader = super::reloader_for(&config);

    let summary = issue(&config, &store, &ca, &reloader, &domain, dry_run);
    match summary.domains.first() {
        Some((_, outcome)) if outcome.is_failure() => {
            output::error(&format!("Failed to obtain certificate for {}", domain))
        }
        Some((_, autocert_core::DomainOutcome::Renewed)) => {
            output::success(&format!("Certificate obtained for {}", domain))
        }
        _ => output::muted(&format!("Nothing invoked for {}", domain)),
    }
    output::muted(&format!("Web server reload: {}", summary.reload));

    Ok(summary.exit_code())
}

/// Force one domain through the renewal invoker.
pub fn issue<C: CaClient, R: Reloader>(
    config: &RunConfig,
    store: &CertStore,
    ca: &C,
    reloader: &R,
    domain: &str,
    dry_run: bool,
) -> RunSummary {
    let reason = match store.lookup(domain) {
        Ok(Some(record)) => DueReason::Expiring {
            days_remaining: record.days_remaining,
        },
        Ok(None) => DueReason::Missing,
        Err(e) => {
            tracing::warn!("Could not read existing certificate for {}: {}", domain, e);
            DueReason::Missing
        }
    };

    let mut renewer = Renewer::new(ca, reloader);
    renewer.reload_webserver = config.reload_webserver;
    renewer.renewals_enabled = config.renewals_enabled && !dry_run;
    renewer.run(vec![DomainDecision {
        domain: DomainConfig::new(domain, config.threshold_for(domain)),
        decision: RenewalDecision::Due { reason },
    }])
}
