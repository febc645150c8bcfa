//! Renewal invoker
//!
//! Handles:
//! - Splitting configured domains into due / current / lookup errors
//! - Invoking the CA client once per due domain, sequentially
//! - A single web server reload after the batch when anything was renewed

mod certbot;
mod reload;

pub use certbot::{CaClient, Certbot, IssueRequest};
pub use reload::{CommandReloader, Reloader};

use autocert_core::{
    DomainDecision, DomainOutcome, DueReason, Partition, ReloadOutcome, RenewalDecision,
    RunSummary,
};
use std::collections::HashMap;

/// Drives one batch of renewals
pub struct Renewer<'a, C: CaClient, R: Reloader> {
    ca: &'a C,
    reloader: &'a R,
    /// Reload after at least one successful renewal
    pub reload_webserver: bool,
    /// When false, due domains are reported as skipped
    pub renewals_enabled: bool,
}

impl<'a, C: CaClient, R: Reloader> Renewer<'a, C, R> {
    pub fn new(ca: &'a C, reloader: &'a R) -> Self {
        Self {
            ca,
            reloader,
            reload_webserver: true,
            renewals_enabled: true,
        }
    }

    /// Act on a run's decisions. Outcomes come back in the order given.
    ///
    /// A failure for one domain never stops the rest of the batch.
    pub fn run(&self, decisions: Vec<DomainDecision>) -> RunSummary {
        let order: Vec<String> = decisions.iter().map(|d| d.domain.name.clone()).collect();
        let partition = Partition::new(decisions);
        tracing::info!(
            "{} due, {} current, {} lookup errors",
            partition.due.len(),
            partition.current.len(),
            partition.lookup_errors.len()
        );

        let mut outcomes: HashMap<String, DomainOutcome> = HashMap::new();

        for d in &partition.current {
            outcomes.insert(d.domain.name.clone(), DomainOutcome::Current);
        }
        for d in &partition.lookup_errors {
            let message = match &d.decision {
                RenewalDecision::LookupError { message } => message.clone(),
                other => other.to_string(),
            };
            tracing::error!("Skipping {}: {}", d.domain.name, message);
            outcomes.insert(d.domain.name.clone(), DomainOutcome::LookupFailed { message });
        }

        self.renew_due(&partition.due, &mut outcomes);

        let renewed = outcomes
            .values()
            .any(|o| matches!(o, DomainOutcome::Renewed));
        let reload = self.reload_once(renewed);

        let domains = order
            .into_iter()
            .filter_map(|name| outcomes.remove(&name).map(|o| (name, o)))
            .collect();

        RunSummary { domains, reload }
    }

    fn renew_due(&self, due: &[DomainDecision], outcomes: &mut HashMap<String, DomainOutcome>) {
        if due.is_empty() {
            return;
        }

        if !self.renewals_enabled {
            for d in due {
                tracing::warn!("{} is {}, but renewals are disabled", d.domain.name, d.decision);
                outcomes.insert(d.domain.name.clone(), DomainOutcome::Skipped);
            }
            return;
        }

        match self.ca.probe() {
            Ok(version) => tracing::info!("Using CA client {}", version),
            Err(e) => {
                tracing::error!("CA client unavailable: {}", e);
                for d in due {
                    outcomes.insert(
                        d.domain.name.clone(),
                        DomainOutcome::RenewFailed {
                            message: e.to_string(),
                        },
                    );
                }
                return;
            }
        }

        for d in due {
            let force_renewal = matches!(
                d.decision,
                RenewalDecision::Due {
                    reason: DueReason::Expiring { .. }
                }
            );
            tracing::info!("Renewing {} ({})", d.domain.name, d.decision);

            let request = IssueRequest {
                domain: &d.domain.name,
                force_renewal,
            };
            let outcome = match self.ca.obtain(&request) {
                Ok(()) => {
                    tracing::info!("Certificate obtained for {}", d.domain.name);
                    DomainOutcome::Renewed
                }
                Err(e) => {
                    tracing::error!("Failed to renew certificate for {}: {}", d.domain.name, e);
                    DomainOutcome::RenewFailed {
                        message: e.to_string(),
                    }
                }
            };
            outcomes.insert(d.domain.name.clone(), outcome);
        }
    }

    fn reload_once(&self, renewed: bool) -> ReloadOutcome {
        if !self.reload_webserver {
            return ReloadOutcome::NotRequested;
        }
        if !renewed {
            return ReloadOutcome::NotNeeded;
        }

        match self.reloader.reload() {
            Ok(()) => ReloadOutcome::Reloaded,
            Err(e) => {
                tracing::error!("Failed to reload web server: {}", e);
                ReloadOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::certbot::CaClientError;
    use super::reload::ReloadError;
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Records every call; fails `obtain` for listed domains
    #[derive(Default)]
    pub struct FakeCa {
        pub unavailable: bool,
        pub failing: HashSet<String>,
        pub probes: RefCell<usize>,
        pub obtained: RefCell<Vec<(String, bool)>>,
    }

    impl FakeCa {
        pub fn failing(domains: &[&str]) -> Self {
            Self {
                failing: domains.iter().map(|d| d.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn domains(&self) -> Vec<String> {
            self.obtained.borrow().iter().map(|(d, _)| d.clone()).collect()
        }
    }

    impl CaClient for FakeCa {
        fn probe(&self) -> Result<String, CaClientError> {
            *self.probes.borrow_mut() += 1;
            if self.unavailable {
                return Err(CaClientError::NotFound("certbot".to_string()));
            }
            Ok("certbot 2.11.0".to_string())
        }

        fn obtain(&self, request: &IssueRequest<'_>) -> Result<(), CaClientError> {
            self.obtained
                .borrow_mut()
                .push((request.domain.to_string(), request.force_renewal));
            if self.failing.contains(request.domain) {
                return Err(CaClientError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "Challenge failed".to_string(),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeReloader {
        pub fail: bool,
        pub calls: RefCell<usize>,
    }

    impl Reloader for FakeReloader {
        fn reload(&self) -> Result<(), ReloadError> {
            *self.calls.borrow_mut() += 1;
            if self.fail {
                return Err(ReloadError::Failed {
                    command: "systemctl reload nginx".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "nginx.service not loaded".to_string(),
                });
            }
            Ok(())
        }
    }
}
