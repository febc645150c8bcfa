use std::path::Path;

use autocert_core::{DomainConfig, DomainDecision, DomainOutcome, RenewalDecision, RunSummary};

use crate::config::RunConfig;
use crate::output;
use crate::renew::{CaClient, Reloader, Renewer};
use crate::store::CertStore;

/// Default mode: inspect every configured domain and renew those that are due.
pub fn run(config_path: Option<&Path>, dry_run: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let config = RunConfig::load(config_path)?;
    config.require_domains()?;

    if config.webroot.is_none() {
        output::warning("WEBROOT_PATH is not set; certbot will run in standalone mode");
    }

    let store = super::store_for(&config);
    let ca = super::certbot_for(&config);
    let reloader = super::reloader_for(&config);

    let summary = check_and_renew(&config, &store, &ca, &reloader, dry_run);
    print_summary(&summary);
    Ok(summary.exit_code())
}

/// Inspect, decide and act for every configured domain.
pub fn check_and_renew<C: CaClient, R: Reloader>(
    config: &RunConfig,
    store: &CertStore,
    ca: &C,
    reloader: &R,
    dry_run: bool,
) -> RunSummary {
    let renewals_enabled = config.renewals_enabled && !dry_run;
    if !renewals_enabled {
        output::muted("Renewals are disabled for this run; reporting only.");
    }

    let decisions = config
        .domains
        .iter()
        .map(|domain| evaluate(store, domain, renewals_enabled))
        .collect();

    let mut renewer = Renewer::new(ca, reloader);
    renewer.reload_webserver = config.reload_webserver;
    renewer.renewals_enabled = renewals_enabled;
    renewer.run(decisions)
}

fn evaluate(store: &CertStore, domain: &DomainConfig, renewals_enabled: bool) -> DomainDecision {
    output::step(&format!("Checking certificate for {}", domain.name));

    let lookup = store.lookup(&domain.name);
    if let Ok(Some(record)) = &lookup {
        output::detail(&format!(
            "  {} issued by {}, expires {}",
            record.path.display(),
            record.issuer,
            record.expiry_display()
        ));
    }

    let decision = RenewalDecision::evaluate(lookup.as_ref().map(Option::as_ref), domain.threshold_days);
    match &decision {
        RenewalDecision::Current { days_remaining } => output::success(&format!(
            "{} is valid for {} days (threshold {}). No renewal needed.",
            domain.name, days_remaining, domain.threshold_days
        )),
        RenewalDecision::Due { .. } => {
            output::warning(&due_message(&domain.name, &decision, renewals_enabled))
        }
        RenewalDecision::LookupError { message } => {
            output::error(&format!("{}: {}", domain.name, message))
        }
    }

    DomainDecision {
        domain: domain.clone(),
        decision,
    }
}

fn due_message(domain: &str, decision: &RenewalDecision, renewals_enabled: bool) -> String {
    if renewals_enabled {
        format!("{} is {}. Renewing.", domain, decision)
    } else {
        format!("{} is {}. Not renewing (renewals disabled).", domain, decision)
    }
}

fn print_summary(summary: &RunSummary) {
    output::section("Summary");
    for (domain, outcome) in &summary.domains {
        match outcome {
            DomainOutcome::Current => output::muted(&format!("  {}: current", domain)),
            DomainOutcome::Renewed => output::success(&format!("{}: renewed", domain)),
            DomainOutcome::Skipped => output::warning(&format!("{}: due, skipped", domain)),
            DomainOutcome::RenewFailed { message } => {
                output::error(&format!("{}: renewal failed: {}", domain, message))
            }
            DomainOutcome::LookupFailed { message } => {
                output::error(&format!("{}: lookup failed: {}", domain, message))
            }
        }
    }
    output::muted(&format!(
        "{} renewed, {} current, {} failed, {} skipped; reload {}",
        summary.renewed(),
        summary.current(),
        summary.failed(),
        summary.skipped(),
        summary.reload
    ));
}
