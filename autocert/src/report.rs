//! Certificate listing
//!
//! Pure formatting over records already read from the store.

use autocert_core::CertificateRecord;

const DOMAIN_WIDTH: usize = 32;
const ISSUER_WIDTH: usize = 32;
const EXPIRES_WIDTH: usize = 23;

/// Sort soonest-to-expire first; ties by domain so output is stable.
pub fn sort_by_urgency(records: &mut [CertificateRecord]) {
    records.sort_by(|a, b| {
        a.days_remaining
            .cmp(&b.days_remaining)
            .then_with(|| a.domain.cmp(&b.domain))
    });
}

/// Fixed-column table of records, in the order given.
pub fn render_table(records: &[CertificateRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<dw$} {:<iw$} {:<ew$} {:>5}\n",
        "DOMAIN",
        "ISSUER",
        "EXPIRES",
        "DAYS",
        dw = DOMAIN_WIDTH,
        iw = ISSUER_WIDTH,
        ew = EXPIRES_WIDTH,
    ));
    out.push_str(&"-".repeat(DOMAIN_WIDTH + ISSUER_WIDTH + EXPIRES_WIDTH + 5 + 3));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{:<dw$} {:<iw$} {:<ew$} {:>5}\n",
            truncate(&record.domain, DOMAIN_WIDTH),
            truncate(&record.issuer, ISSUER_WIDTH),
            record.expiry_display(),
            record.days_remaining,
            dw = DOMAIN_WIDTH,
            iw = ISSUER_WIDTH,
            ew = EXPIRES_WIDTH,
        ));
    }

    out
}

/// JSON array of records, in the order given.
pub fn render_json(records: &[CertificateRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Cut a cell to `width` characters, marking the cut with `…`.
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
