//! Web server reload

use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("Reload command is empty")]
    EmptyCommand,

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Signals the web server to pick up renewed certificates
pub trait Reloader {
    fn reload(&self) -> Result<(), ReloadError>;
}

/// Runs a fixed argv, e.g. `systemctl reload nginx`
#[derive(Debug, Clone)]
pub struct CommandReloader {
    argv: Vec<String>,
}

impl CommandReloader {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl Reloader for CommandReloader {
    fn reload(&self) -> Result<(), ReloadError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(ReloadError::EmptyCommand);
        };

        let command = self.argv.join(" ");
        tracing::info!("Reloading web server: {}", command);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ReloadError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ReloadError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
