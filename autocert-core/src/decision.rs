//! Renewal decisions

use crate::domain::{CertificateRecord, DomainConfig};
use serde::{Deserialize, Serialize};

/// Why a domain is due for renewal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DueReason {
    /// No certificate exists in the store
    Missing,
    /// Certificate exists but is at or below the threshold
    Expiring { days_remaining: i64 },
}

/// Outcome of evaluating one configured domain against its threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RenewalDecision {
    Due { reason: DueReason },
    Current { days_remaining: i64 },
    LookupError { message: String },
}

impl RenewalDecision {
    /// Decide from the result of a certificate lookup.
    ///
    /// `Ok(None)` means the store has no certificate for the domain.
    pub fn evaluate<E: std::fmt::Display>(
        lookup: Result<Option<&CertificateRecord>, E>,
        threshold_days: u32,
    ) -> Self {
        match lookup {
            Err(e) => Self::LookupError {
                message: e.to_string(),
            },
            Ok(None) => Self::Due {
                reason: DueReason::Missing,
            },
            Ok(Some(record)) if record.days_remaining <= i64::from(threshold_days) => Self::Due {
                reason: DueReason::Expiring {
                    days_remaining: record.days_remaining,
                },
            },
            Ok(Some(record)) => Self::Current {
                days_remaining: record.days_remaining,
            },
        }
    }

    pub fn is_due(&self) -> bool {
        matches!(self, Self::Due { .. })
    }
}

impl std::fmt::Display for RenewalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenewalDecision::Due {
                reason: DueReason::Missing,
            } => write!(f, "due (no certificate)"),
            RenewalDecision::Due {
                reason: DueReason::Expiring { days_remaining },
            } if *days_remaining < 0 => write!(f, "due (expired {} days ago)", -days_remaining),
            RenewalDecision::Due {
                reason: DueReason::Expiring { days_remaining },
            } => write!(f, "due ({} days left)", days_remaining),
            RenewalDecision::Current { days_remaining } => {
                write!(f, "current ({} days left)", days_remaining)
            }
            RenewalDecision::LookupError { message } => write!(f, "lookup error: {}", message),
        }
    }
}

/// A configured domain paired with its decision for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDecision {
    pub domain: DomainConfig,
    pub decision: RenewalDecision,
}

/// Configured domains split by decision, each half keeping config order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub due: Vec<DomainDecision>,
    pub current: Vec<DomainDecision>,
    pub lookup_errors: Vec<DomainDecision>,
}

impl Partition {
    pub fn new(decisions: impl IntoIterator<Item = DomainDecision>) -> Self {
        let mut partition = Self::default();
        for d in decisions {
            match d.decision {
                RenewalDecision::Due { .. } => partition.due.push(d),
                RenewalDecision::Current { .. } => partition.current.push(d),
                RenewalDecision::LookupError { .. } => partition.lookup_errors.push(d),
            }
        }
        partition
    }
}
