//! Fixture certificates for unit tests

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::datetime;

/// Fixed inspection instant used across tests.
pub const NOW: OffsetDateTime = datetime!(2026-06-01 12:00 UTC);

/// Write `<store>/<domain>/cert.pem` expiring at `not_after`.
pub fn write_cert(store: &Path, domain: &str, not_after: OffsetDateTime) -> PathBuf {
    write_cert_file(store, domain, "cert.pem", not_after)
}

pub fn write_cert_file(
    store: &Path,
    domain: &str,
    file_name: &str,
    not_after: OffsetDateTime,
) -> PathBuf {
    let dir = store.join(domain);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file_name);
    std::fs::write(&path, cert_pem(domain, not_after)).unwrap();
    path
}

/// Self-signed PEM whose issuer reads "Autocert Test CA (Test R1)".
pub fn cert_pem(domain: &str, not_after: OffsetDateTime) -> String {
    let mut params = CertificateParams::new(vec![domain.to_string()]).unwrap();

    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, "Autocert Test CA");
    dn.push(DnType::CommonName, "Test R1");
    params.distinguished_name = dn;

    params.not_before = not_after - time::Duration::days(90);
    params.not_after = not_after;

    let key = KeyPair::generate().unwrap();
    params.self_signed(&key).unwrap().pem()
}
