//! CA client invocation (certbot)

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use thiserror::Error;

/// Errors invoking the CA client
#[derive(Debug, Error)]
pub enum CaClientError {
    #[error("CA client '{0}' not found")]
    NotFound(String),

    #[error("Failed to run CA client '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CA client exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// One issuance for one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueRequest<'a> {
    pub domain: &'a str,
    /// Replace a certificate the CA client itself would still consider fresh
    pub force_renewal: bool,
}

/// External certificate-authority client
pub trait CaClient {
    /// Check the client can be started. Returns its version line.
    fn probe(&self) -> Result<String, CaClientError>;

    /// Issue or renew a certificate, blocking until the client exits.
    fn obtain(&self, request: &IssueRequest<'_>) -> Result<(), CaClientError>;
}

/// certbot, invoked in webroot mode (standalone when no webroot is set)
#[derive(Debug, Clone)]
pub struct Certbot {
    pub program: String,
    pub webroot: Option<PathBuf>,
    pub email: Option<String>,
    pub staging: bool,
}

impl Certbot {
    /// Arguments for `certbot certonly` for one request.
    pub fn certonly_args(&self, request: &IssueRequest<'_>) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "certonly".into(),
            "--non-interactive".into(),
            "--agree-tos".into(),
        ];

        match &self.email {
            Some(email) => {
                args.push("--email".into());
                args.push(email.clone());
            }
            None => args.push("--register-unsafely-without-email".into()),
        }

        match &self.webroot {
            Some(webroot) => {
                args.push("--webroot".into());
                args.push("-w".into());
                args.push(webroot.to_string_lossy().to_string());
            }
            None => args.push("--standalone".into()),
        }

        args.push("--cert-name".into());
        args.push(request.domain.to_string());
        args.push("-d".into());
        args.push(request.domain.to_string());

        if request.force_renewal {
            args.push("--force-renewal".into());
        }
        if self.staging {
            args.push("--staging".into());
        }

        args
    }

    fn run(&self, args: &[String]) -> Result<Output, CaClientError> {
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaClientError::NotFound(self.program.clone())
                } else {
                    CaClientError::Spawn {
                        program: self.program.clone(),
                        source: e,
                    }
                }
            })
    }
}

impl CaClient for Certbot {
    fn probe(&self) -> Result<String, CaClientError> {
        let output = self.run(&["--version".to_string()])?;
        if !output.status.success() {
            return Err(failed(&output));
        }
        // certbot has printed its version to either stream across releases
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let version = stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
            .to_string();
        Ok(version)
    }

    fn obtain(&self, request: &IssueRequest<'_>) -> Result<(), CaClientError> {
        let args = self.certonly_args(request);
        tracing::info!("Running command: {} {}", self.program, args.join(" "));

        let output = self.run(&args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("{}", stdout.trim_end());
        }

        if !output.status.success() {
            return Err(failed(&output));
        }
        Ok(())
    }
}

fn failed(output: &Output) -> CaClientError {
    CaClientError::Failed {
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certbot() -> Certbot {
        Certbot {
            program: "certbot".to_string(),
            webroot: Some(PathBuf::from("/var/www/html")),
            email: Some("ops@example.com".to_string()),
            staging: false,
        }
    }

    #[test]
    fn webroot_args() {
        let args = certbot().certonly_args(&IssueRequest {
            domain: "example.com",
            force_renewal: false,
        });
        assert_eq!(
            args,
            vec![
                "certonly",
                "--non-interactive",
                "--agree-tos",
                "--email",
                "ops@example.com",
                "--webroot",
                "-w",
                "/var/www/html",
                "--cert-name",
                "example.com",
                "-d",
                "example.com",
            ]
        );
    }

    #[test]
    fn standalone_without_webroot_or_email() {
        let client = Certbot {
            webroot: None,
            email: None,
            staging: true,
            ..certbot()
        };
        let args = client.certonly_args(&IssueRequest {
            domain: "example.org",
            force_renewal: true,
        });
        assert!(args.contains(&"--standalone".to_string()));
        assert!(args.contains(&"--register-unsafely-without-email".to_string()));
        assert!(args.contains(&"--force-renewal".to_string()));
        assert!(args.contains(&"--staging".to_string()));
        assert!(!args.contains(&"--webroot".to_string()));
    }

    #[test]
    fn missing_binary_is_not_found() {
        let client = Certbot {
            program: "/nonexistent/autocert-test/certbot".to_string(),
            ..certbot()
        };
        assert!(matches!(client.probe(), Err(CaClientError::NotFound(_))));
        let err = client
            .obtain(&IssueRequest {
                domain: "example.com",
                force_renewal: false,
            })
            .unwrap_err();
        assert!(matches!(err, CaClientError::NotFound(_)));
    }
}
