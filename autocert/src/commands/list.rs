use std::path::Path;

use crate::config::RunConfig;
use crate::output;
use crate::report;
use crate::store::CertStore;

/// `--list`: every certificate in the store, soonest expiry first.
///
/// Only the store location is needed, so `DOMAINS` may be unset. Lineages that
/// cannot be read are reported on stderr and make the exit code non-zero.
pub fn run(config_path: Option<&Path>, json: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let config = RunConfig::load(config_path)?;
    let store = super::store_for(&config);
    let (rendered, failures) = render(&store, json)?;
    print!("{}", rendered);
    Ok(if failures > 0 { 1 } else { 0 })
}

/// Render the listing; returns the text and the number of unreadable lineages.
pub fn render(store: &CertStore, json: bool) -> Result<(String, usize), Box<dyn std::error::Error>> {
    let mut listing = store.list_all()?;

    for (domain, err) in &listing.errors {
        tracing::warn!("Could not read certificate for {}: {}", domain, err);
        output::error_stderr(&format!("{}: {}", domain, err));
    }

    report::sort_by_urgency(&mut listing.records);

    let rendered = if json {
        let mut out = report::render_json(&listing.records)?;
        out.push('\n');
        out
    } else if listing.records.is_empty() {
        "No certificates found.\n".to_string()
    } else {
        report::render_table(&listing.records)
    };

    Ok((rendered, listing.errors.len()))
}
