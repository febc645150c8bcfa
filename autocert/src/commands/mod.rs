pub mod check;
pub mod issue;
pub mod list;
pub mod renew;

use autocert_core::validate_domain_name;
use time::OffsetDateTime;

use crate::config::RunConfig;
use crate::renew::{Certbot, CommandReloader};
use crate::store::CertStore;

fn store_for(config: &RunConfig) -> CertStore {
    CertStore::new(&config.cert_store, OffsetDateTime::now_utc())
}

fn certbot_for(config: &RunConfig) -> Certbot {
    Certbot {
        program: config.certbot_bin.clone(),
        webroot: config.webroot.clone(),
        email: config.email.clone(),
        staging: config.staging,
    }
}

fn reloader_for(config: &RunConfig) -> CommandReloader {
    CommandReloader::new(config.reload_command.clone())
}

/// Validate a domain given on the command line.
fn cli_domain(domain: &str) -> Result<String, String> {
    let domain = domain.trim();
    validate_domain_name(domain)?;
    Ok(domain.to_string())
}
