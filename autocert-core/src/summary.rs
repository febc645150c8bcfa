//! Per-run summary

use serde::{Deserialize, Serialize};

/// What happened to one configured domain during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DomainOutcome {
    /// Not due; left alone
    Current,
    /// CA client reported success
    Renewed,
    /// CA client failed or could not be started
    RenewFailed { message: String },
    /// Certificate store could not be read for this domain
    LookupFailed { message: String },
    /// Due, but renewals are disabled for this run
    Skipped,
}

impl DomainOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RenewFailed { .. } | Self::LookupFailed { .. })
    }
}

/// Web server reload result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reload", rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// Reload is disabled in configuration
    NotRequested,
    /// Reload is enabled but nothing was renewed
    NotNeeded,
    Reloaded,
    Failed { message: String },
}

impl std::fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReloadOutcome::NotRequested => write!(f, "not requested"),
            ReloadOutcome::NotNeeded => write!(f, "not needed"),
            ReloadOutcome::Reloaded => write!(f, "reloaded"),
            ReloadOutcome::Failed { message } => write!(f, "failed: {}", message),
        }
    }
}

/// Everything a check-and-renew run did, in config order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub domains: Vec<(String, DomainOutcome)>,
    pub reload: ReloadOutcome,
}

impl RunSummary {
    pub fn renewed(&self) -> usize {
        self.count(|o| matches!(o, DomainOutcome::Renewed))
    }

    pub fn failed(&self) -> usize {
        self.count(DomainOutcome::is_failure)
    }

    pub fn current(&self) -> usize {
        self.count(|o| matches!(o, DomainOutcome::Current))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DomainOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&DomainOutcome) -> bool) -> usize {
        self.domains.iter().filter(|(_, o)| pred(o)).count()
    }

    /// Process exit status for the run.
    ///
    /// Non-zero when any domain failed lookup or renewal. A failed reload never
    /// changes the status.
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcomes: Vec<DomainOutcome>, reload: ReloadOutcome) -> RunSummary {
        RunSummary {
            domains: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, o)| (format!("d{}.example.com", i), o))
                .collect(),
            reload,
        }
    }

    #[test]
    fn empty_run_exits_zero() {
        let s = summary(vec![], ReloadOutcome::NotNeeded);
        assert_eq!(s.exit_code(), 0);
    }

    #[test]
    fn all_current_exits_zero() {
        let s = summary(
            vec![DomainOutcome::Current, DomainOutcome::Current],
            ReloadOutcome::NotNeeded,
        );
        assert_eq!(s.exit_code(), 0);
        assert_eq!(s.current(), 2);
    }

    #[test]
    fn any_renewal_failure_exits_nonzero() {
        let s = summary(
            vec![
                DomainOutcome::Renewed,
                DomainOutcome::RenewFailed {
                    message: "exit status 1".to_string(),
                },
            ],
            ReloadOutcome::Reloaded,
        );
        assert_eq!(s.exit_code(), 1);
        assert_eq!(s.renewed(), 1);
        assert_eq!(s.failed(), 1);
    }

    #[test]
    fn lookup_failure_exits_nonzero() {
        let s = summary(
            vec![DomainOutcome::LookupFailed {
                message: "corrupt".to_string(),
            }],
            ReloadOutcome::NotNeeded,
        );
        assert_eq!(s.exit_code(), 1);
    }

    #[test]
    fn reload_failure_does_not_change_exit_code() {
        let s = summary(
            vec![DomainOutcome::Renewed],
            ReloadOutcome::Failed {
                message: "unit not found".to_string(),
            },
        );
        assert_eq!(s.exit_code(), 0);
    }

    #[test]
    fn skipped_domains_are_not_failures() {
        let s = summary(vec![DomainOutcome::Skipped], ReloadOutcome::NotNeeded);
        assert_eq!(s.exit_code(), 0);
        assert_eq!(s.skipped(), 1);
    }
}
