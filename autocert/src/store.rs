//! Certificate inspector over the CA client's on-disk store
//!
//! The store is certbot's `live/` layout: one directory per certificate lineage,
//! each holding `cert.pem` (leaf) and `fullchain.pem`. The store is treated as
//! authoritative and re-read on every run.

use autocert_core::{CertificateRecord, days_remaining};
use std::fs;
use std::path::{Path, PathBuf};
use ::time::OffsetDateTime;
use thiserror::Error;
use x509_parser::prelude::*;

/// Leaf certificate files checked in order inside a lineage directory.
const CERT_FILES: &[&str] = &["cert.pem", "fullchain.pem"];

/// Errors reading the certificate store
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse certificate {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Certificate link {path} points to a missing file")]
    BrokenLink { path: PathBuf },
}

impl LookupError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Everything found under the store, split into parsed records and entries
/// that could not be read.
#[derive(Debug, Default)]
pub struct StoreListing {
    pub records: Vec<CertificateRecord>,
    pub errors: Vec<(String, LookupError)>,
}

/// Read-only view of the CA client's certificate store at a fixed instant
pub struct CertStore {
    cert_dir: PathBuf,
    now: OffsetDateTime,
}

impl CertStore {
    pub fn new(cert_dir: impl Into<PathBuf>, now: OffsetDateTime) -> Self {
        Self {
            cert_dir: cert_dir.into(),
            now,
        }
    }

    pub fn cert_dir(&self) -> &Path {
        &self.cert_dir
    }

    /// Instant days remaining are measured from
    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    /// Look up the certificate for a domain.
    ///
    /// Returns `Ok(None)` when the store has no lineage for the domain, or the
    /// lineage holds no certificate file. A certificate file that is a symlink
    /// to a missing target (certbot's `archive/` gone) is an error, not absent.
    pub fn lookup(&self, domain: &str) -> Result<Option<CertificateRecord>, LookupError> {
        let domain_dir = self.cert_dir.join(domain);
        match domain_dir.try_exists() {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => return Err(LookupError::io(&domain_dir, e)),
        }

        for name in CERT_FILES {
            let cert_path = domain_dir.join(name);
            match fs::symlink_metadata(&cert_path) {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(LookupError::io(&cert_path, e)),
            }

            let target_exists = cert_path
                .try_exists()
                .map_err(|e| LookupError::io(&cert_path, e))?;
            if !target_exists {
                return Err(LookupError::BrokenLink { path: cert_path });
            }
            return self.load_record(domain, &cert_path).map(Some);
        }

        Ok(None)
    }

    /// Enumerate every lineage in the store.
    ///
    /// A missing store is empty. Non-directory entries (certbot keeps a README
    /// there) are ignored. Lineages that fail to parse land in `errors`.
    pub fn list_all(&self) -> Result<StoreListing, LookupError> {
        let mut listing = StoreListing::default();

        let exists = self
            .cert_dir
            .try_exists()
            .map_err(|e| LookupError::io(&self.cert_dir, e))?;
        if !exists {
            return Ok(listing);
        }

        let entries =
            fs::read_dir(&self.cert_dir).map_err(|e| LookupError::io(&self.cert_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| LookupError::io(&self.cert_dir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let domain = entry.file_name().to_string_lossy().to_string();

            match self.lookup(&domain) {
                Ok(Some(record)) => listing.records.push(record),
                Ok(None) => {
                    tracing::debug!("Skipping {}: no certificate file", path.display());
                }
                Err(e) => listing.errors.push((domain, e)),
            }
        }

        Ok(listing)
    }

    fn load_record(&self, domain: &str, cert_path: &Path) -> Result<CertificateRecord, LookupError> {
        let pem_data = fs::read(cert_path).map_err(|e| LookupError::io(cert_path, e))?;

        // The leaf is the first CERTIFICATE block in both cert.pem and fullchain.pem
        for pem in Pem::iter_from_buffer(&pem_data) {
            let pem = pem.map_err(|e| LookupError::parse(cert_path, e.to_string()))?;
            if pem.label != "CERTIFICATE" {
                continue;
            }

            let (_, cert) = X509Certificate::from_der(&pem.contents)
                .map_err(|e| LookupError::parse(cert_path, e.to_string()))?;

            let validity = cert.validity();
            let not_before = validity.not_before.to_datetime();
            let not_after = validity.not_after.to_datetime();

            return Ok(CertificateRecord {
                domain: domain.to_string(),
                issuer: issuer_label(&cert),
                not_before,
                not_after,
                days_remaining: days_remaining(not_after, self.now),
                path: cert_path.to_path_buf(),
            });
        }

        Err(LookupError::parse(cert_path, "no certificate found in PEM file"))
    }
}

/// `"<O> (<CN>)"`, falling back to whichever is present, then the full DN.
fn issuer_label(cert: &X509Certificate<'_>) -> String {
    let issuer = cert.issuer();
    let org = issuer
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok());
    let cn = issuer
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok());

    match (org, cn) {
        (Some(org), Some(cn)) => format!("{} ({})", org, cn),
        (Some(org), None) => org.to_string(),
        (None, Some(cn)) => cn.to_string(),
        (None, None) => issuer.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NOW, write_cert, write_cert_file};
    use ::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn lookup_reads_expiry_and_issuer() {
        let temp = TempDir::new().unwrap();
        write_cert(temp.path(), "example.com", NOW + Duration::days(10));

        let store = CertStore::new(temp.path(), NOW);
        let record = store.lookup("example.com").unwrap().unwrap();

        assert_eq!(record.domain, "example.com");
        assert_eq!(record.issuer, "Autocert Test CA (Test R1)");
        assert_eq!(record.not_after, NOW + Duration::days(10));
        assert_eq!(record.days_remaining, 10);
        assert_eq!(record.path, temp.path().join("example.com/cert.pem"));
    }

    #[test]
    fn lookup_floors_partial_days() {
        let temp = TempDir::new().unwrap();
        write_cert(
            temp.path(),
            "example.com",
            NOW + Duration::days(44) + Duration::hours(23),
        );

        let store = CertStore::new(temp.path(), NOW);
        let record = store.lookup("example.com").unwrap().unwrap();
        assert_eq!(record.days_remaining, 44);
    }

    #[test]
    fn lookup_reports_expired_as_negative() {
        let temp = TempDir::new().unwrap();
        write_cert(temp.path(), "old.example.com", NOW - Duration::days(3));

        let store = CertStore::new(temp.path(), NOW);
        let record = store.lookup("old.example.com").unwrap().unwrap();
        assert_eq!(record.days_remaining, -3);
        assert!(record.is_expired());
    }

    #[test]
    fn lookup_missing_domain_is_none() {
        let temp = TempDir::new().unwrap();
        let store = CertStore::new(temp.path(), NOW);
        assert!(store.lookup("example.com").unwrap().is_none());

        std::fs::create_dir_all(temp.path().join("empty.example.com")).unwrap();
        assert!(store.lookup("empty.example.com").unwrap().is_none());
    }

    #[test]
    fn lookup_falls_back_to_fullchain() {
        let temp = TempDir::new().unwrap();
        write_cert_file(
            temp.path(),
            "example.com",
            "fullchain.pem",
            NOW + Duration::days(60),
        );

        let store = CertStore::new(temp.path(), NOW);
        let record = store.lookup("example.com").unwrap().unwrap();
        assert_eq!(record.days_remaining, 60);
        assert!(record.path.ends_with("fullchain.pem"));
    }

    #[test]
    fn lookup_corrupt_certificate_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("example.com");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("cert.pem"),
            "-----BEGIN CERTIFICATE-----\nbm90IGEgY2VydA==\n-----END CERTIFICATE-----\n",
        )
        .unwrap();

        let store = CertStore::new(temp.path(), NOW);
        let err = store.lookup("example.com").unwrap_err();
        assert!(matches!(err, LookupError::Parse { .. }));
    }

    #[test]
    fn lookup_pem_without_certificate_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("example.com");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cert.pem"), "not pem at all\n").unwrap();

        let store = CertStore::new(temp.path(), NOW);
        assert!(store.lookup("example.com").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn lookup_dangling_links_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("example.com");
        std::fs::create_dir_all(&dir).unwrap();
        let archive = temp.path().join("archive/example.com");
        std::os::unix::fs::symlink(archive.join("cert1.pem"), dir.join("cert.pem")).unwrap();
        std::os::unix::fs::symlink(archive.join("fullchain1.pem"), dir.join("fullchain.pem"))
            .unwrap();

        let store = CertStore::new(temp.path(), NOW);
        let err = store.lookup("example.com").unwrap_err();
        assert!(
            matches!(&err, LookupError::BrokenLink { path } if path.ends_with("cert.pem")),
            "unexpected error: {err}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn lookup_follows_valid_links() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("archive");
        write_cert(&archive, "example.com", NOW + Duration::days(20));

        let dir = temp.path().join("live/example.com");
        std::fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink(archive.join("example.com/cert.pem"), dir.join("cert.pem"))
            .unwrap();

        let store = CertStore::new(temp.path().join("live"), NOW);
        let record = store.lookup("example.com").unwrap().unwrap();
        assert_eq!(record.days_remaining, 20);
    }

    #[cfg(unix)]
    #[test]
    fn list_all_reports_dangling_lineage() {
        let temp = TempDir::new().unwrap();
        write_cert(temp.path(), "ok.example.com", NOW + Duration::days(40));
        let dir = temp.path().join("gone.example.com");
        std::fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing.pem"), dir.join("cert.pem")).unwrap();

        let store = CertStore::new(temp.path(), NOW);
        let listing = store.list_all().unwrap();
        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.errors[0].0, "gone.example.com");
        assert!(matches!(listing.errors[0].1, LookupError::BrokenLink { .. }));
    }

    #[test]
    fn list_all_includes_every_lineage() {
        let temp = TempDir::new().unwrap();
        write_cert(temp.path(), "a.example.com", NOW + Duration::days(80));
        write_cert(temp.path(), "b.example.com", NOW + Duration::days(5));
        std::fs::write(temp.path().join("README"), "certbot readme\n").unwrap();
        std::fs::create_dir_all(temp.path().join("broken.example.com")).unwrap();
        std::fs::write(temp.path().join("broken.example.com/cert.pem"), "garbage").unwrap();

        let store = CertStore::new(temp.path(), NOW);
        let listing = store.list_all().unwrap();

        let mut domains: Vec<_> = listing.records.iter().map(|r| r.domain.as_str()).collect();
        domains.sort();
        assert_eq!(domains, vec!["a.example.com", "b.example.com"]);
        assert_eq!(listing.errors.len(), 1);
        assert_eq!(listing.errors[0].0, "broken.example.com");
    }

    #[test]
    fn list_all_missing_store_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = CertStore::new(temp.path().join("does-not-exist"), NOW);
        let listing = store.list_all().unwrap();
        assert!(listing.records.is_empty());
        assert!(listing.errors.is_empty());
    }
}
